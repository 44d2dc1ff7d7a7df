mod feature_collection;
mod kml;
pub mod legacy;
mod local_csv;
mod traj;
mod wgs84_csv;

use std::path::Path;

use crate::{Error, Result, Trajectory};

pub use self::legacy::{LegacyPath, Marker};

/// Every file format a trajectory can be read from and written to
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatKind {
    /// The JSON format with columns, sections and annotations
    Traj,
    /// The old whitespace-separated text format
    Legacy,
    Kml,
    /// Latitude, longitude, altitude rows
    Wgs84Csv,
    /// Rows in the local frame, with arbitrary columns
    Csv,
    GeoJson,
}

// Longer suffixes first, so ".wgs84.csv" wins over ".csv"
const SUFFIXES: [(&str, FormatKind); 6] = [
    (".wgs84.csv", FormatKind::Wgs84Csv),
    (".geojson", FormatKind::GeoJson),
    (".traj", FormatKind::Traj),
    (".txt", FormatKind::Legacy),
    (".kml", FormatKind::Kml),
    (".csv", FormatKind::Csv),
];

impl FormatKind {
    pub fn all() -> impl Iterator<Item = FormatKind> {
        SUFFIXES.iter().map(|(_, kind)| *kind)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|x| x.to_string_lossy())
            .unwrap_or_default();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))
    }

    pub fn suffix(self) -> &'static str {
        SUFFIXES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(suffix, _)| *suffix)
            .unwrap_or_default()
    }

    /// Which parts of a trajectory survive writing and reading back in this format
    pub fn keeps_sections(self) -> bool {
        matches!(
            self,
            FormatKind::Traj | FormatKind::Legacy | FormatKind::GeoJson
        )
    }

    pub fn keeps_annotations(self) -> bool {
        matches!(self, FormatKind::Traj | FormatKind::GeoJson)
    }

    pub fn decode(self, input: &str) -> Result<Trajectory> {
        match self {
            FormatKind::Traj => traj::decode(input),
            FormatKind::Legacy => legacy::decode(input).map(|legacy| legacy.trajectory),
            FormatKind::Kml => kml::decode(input),
            FormatKind::Wgs84Csv => wgs84_csv::decode(input),
            FormatKind::Csv => local_csv::decode(input),
            FormatKind::GeoJson => feature_collection::decode(input),
        }
    }

    pub fn encode(self, traj: &Trajectory) -> Result<String> {
        match self {
            FormatKind::Traj => traj::encode(traj),
            FormatKind::Legacy => legacy::encode(traj),
            FormatKind::Kml => kml::encode(traj),
            FormatKind::Wgs84Csv => wgs84_csv::encode(traj),
            FormatKind::Csv => local_csv::encode(traj),
            FormatKind::GeoJson => feature_collection::encode(traj),
        }
    }
}

/// Reads a trajectory, picking the format from the file name. The trajectory is named after the
/// file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Trajectory> {
    let path = path.as_ref();
    let kind = FormatKind::from_path(path)?;
    let input = fs_err::read_to_string(path)?;
    let mut traj = kind.decode(&input)?;
    if let Some(name) = path.file_name() {
        traj.set_name(name.to_string_lossy());
    }
    info!(
        "Loaded {} points in {} sections from {}",
        traj.len(),
        traj.num_sections(),
        path.display()
    );
    Ok(traj)
}

/// Writes a trajectory, picking the format from the file name. The whole file is written at once,
/// not atomically.
pub fn save<P: AsRef<Path>>(traj: &Trajectory, path: P) -> Result<()> {
    let path = path.as_ref();
    let kind = FormatKind::from_path(path)?;
    let output = kind.encode(traj)?;
    fs_err::write(path, output)?;
    info!("Wrote {} points to {}", traj.len(), path.display());
    Ok(())
}

/// Rounds to a fixed number of decimals, like the precision of geodetic output
fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

/// The x and y of every point, failing when the trajectory is empty
fn require_points(traj: &Trajectory, format: &str) -> Result<Vec<(f64, f64)>> {
    if traj.is_empty() {
        return Err(Error::format(format!(
            "can't write an empty trajectory as {format}"
        )));
    }
    Ok(traj.positions())
}
