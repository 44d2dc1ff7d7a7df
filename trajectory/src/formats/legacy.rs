//! The old text format. The first line names the frame, the second holds the anchor, then comes
//! the number of sections. Each section has a "num_points num_columns" header and one line per
//! point: `x y [speed [marker_count]]`.

use std::fmt::Write;
use std::str::Lines;

use crate::{Error, GeoPoint, Result, Trajectory};

const FRAME: &str = "WGS84";
const NUM_COLUMNS: usize = 4;

/// A point where the marker count changes. Markers aren't part of the trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    /// Index into the flat point list
    pub point_index: usize,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub marker_count: u32,
}

pub struct LegacyPath {
    /// Always has columns x, y, speed
    pub trajectory: Trajectory,
    pub markers: Vec<Marker>,
}

struct Reader<'a> {
    lines: Lines<'a>,
    line_number: usize,
}

impl<'a> Reader<'a> {
    fn next(&mut self, what: &str) -> Result<&'a str> {
        self.line_number += 1;
        self.lines.next().map(|line| line.trim()).ok_or_else(|| {
            Error::format(format!(
                "legacy file ends at line {} while reading {what}",
                self.line_number
            ))
        })
    }

    fn err(&self, msg: String) -> Error {
        Error::format(format!("legacy file line {}: {msg}", self.line_number))
    }
}

pub fn decode(input: &str) -> Result<LegacyPath> {
    let mut reader = Reader {
        lines: input.lines(),
        line_number: 0,
    };

    let frame = reader.next("the frame")?;
    if frame != FRAME {
        warn!("Legacy file uses frame '{frame}'; treating it as {FRAME}");
    }

    let anchor = parse_floats(reader.next("the anchor")?).map_err(|err| reader.err(err))?;
    if anchor.len() != 3 {
        return Err(reader.err(format!("the anchor needs 3 values, got {}", anchor.len())));
    }
    let anchor = GeoPoint::new(anchor[0], anchor[1], anchor[2]);

    let num_sections: usize = reader
        .next("the number of sections")?
        .parse()
        .map_err(|err| reader.err(format!("bad number of sections: {err}")))?;

    let mut trajectory = Trajectory::new(
        vec!["x".to_string(), "y".to_string(), "speed".to_string()],
        anchor,
    )?;
    let mut markers = Vec::new();
    let mut prev_marker_count = 0;

    for _ in 0..num_sections {
        let header = reader.next("a section header")?;
        let num_points: usize = header
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(|err| reader.err(format!("bad section header '{header}': {err}")))?;

        // The header's count isn't trusted for allocating
        let mut points = Vec::new();
        for _ in 0..num_points {
            let values = parse_floats(reader.next("a point")?).map_err(|err| reader.err(err))?;
            let (x, y, speed, marker_count) = match values[..] {
                [x, y] => (x, y, 0.0, 0),
                [x, y, speed] => (x, y, speed, 0),
                [x, y, speed, count] => {
                    let count = parse_marker_count(count).map_err(|err| reader.err(err))?;
                    (x, y, speed, count)
                }
                _ => {
                    return Err(reader.err(format!(
                        "a point needs 2 to 4 values, got {}",
                        values.len()
                    )))
                }
            };

            if marker_count != prev_marker_count {
                markers.push(Marker {
                    point_index: trajectory.len() + points.len(),
                    x,
                    y,
                    speed,
                    marker_count,
                });
            }
            prev_marker_count = marker_count;
            points.push([x, y, speed]);
        }
        trajectory.append_section(&points)?;
    }

    debug!(
        "Legacy file has {} points and {} markers",
        trajectory.len(),
        markers.len()
    );
    Ok(LegacyPath {
        trajectory,
        markers,
    })
}

fn parse_floats(line: &str) -> std::result::Result<Vec<f64>, String> {
    line.split_whitespace()
        .map(|x| x.parse::<f64>().map_err(|err| format!("bad number '{x}': {err}")))
        .collect()
}

fn parse_marker_count(x: f64) -> std::result::Result<u32, String> {
    if x.fract() != 0.0 || x < 0.0 || x > u32::MAX as f64 {
        return Err(format!("marker count {x} isn't a natural number"));
    }
    Ok(x as u32)
}

/// Writes x, y, and speed (0 without a speed column) with 3 decimals. Markers aren't kept.
pub fn encode(traj: &Trajectory) -> Result<String> {
    let speed_idx = traj.column_index("speed");
    let anchor = traj.anchor();

    let mut out = String::new();
    writeln!(out, "{FRAME}")?;
    writeln!(out, "{} {} {}", anchor.lat, anchor.lon, anchor.alt)?;
    writeln!(out, "{}", traj.num_sections())?;

    let positions = traj.positions();
    let mut idx = 0;
    for section in traj.sections() {
        writeln!(out, "{} {NUM_COLUMNS}", section.len())?;
        for pt in section {
            let (x, y) = positions[idx];
            let speed = speed_idx.map(|i| pt[i]).unwrap_or(0.0);
            writeln!(out, "{x:.3} {y:.3} {speed:.3} 0")?;
            idx += 1;
        }
    }
    Ok(out)
}
