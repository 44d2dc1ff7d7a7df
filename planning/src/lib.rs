//! Turns the output of a coverage path planner into guidance trajectories: resampling the states
//! to a fixed step, then splitting them into sections and work/turn zones.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod discretize;
mod state;
mod zones;

pub use self::discretize::Discretizer;
pub use self::state::{load_states, Direction, PathState, PlannerState, SegmentType};
pub use self::zones::{annotate, ZoneAnnotator, TURN_ZONE, WORK_ZONE};
