//! Guidance trajectories for field robots: a local-frame point list anchored to a WGS84
//! position, split into sections and annotated with zones, readable and writable in several
//! file formats.

#[macro_use]
extern crate log;

mod error;
pub mod formats;
pub mod transform;
mod trajectory;

pub use self::error::{Error, Result};
pub use self::formats::{load, save, FormatKind};
pub use self::trajectory::{Annotation, AnnotationKind, ExtraColumns, Trajectory};
pub use self::transform::{GeoPoint, LocalFrame};
