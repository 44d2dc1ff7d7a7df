use std::convert::TryFrom;

use anyhow::Result;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// +1 driving forwards, -1 in reverse
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = anyhow::Error;

    fn try_from(x: i64) -> Result<Self> {
        match x {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            _ => bail!("Direction must be 1 or -1, not {}", x),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    /// Working the field along a straight pass
    Swath,
    /// Maneuvering between two swaths
    Turn,
}

/// One state produced by a coverage path planner. The planner itself lives elsewhere; this is
/// everything the resampler and zone annotator need from it.
pub trait PlannerState {
    fn position(&self) -> Point3<f64>;
    /// Unsigned speed in m/s
    fn velocity(&self) -> f64;
    fn direction(&self) -> Direction;
    fn segment_type(&self) -> SegmentType;
    /// Heading in radians
    fn angle(&self) -> f64;
    /// Seconds until the next state, if known
    fn duration(&self) -> Option<f64>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathState {
    pub position: Point3<f64>,
    pub velocity: f64,
    pub direction: Direction,
    pub segment_type: SegmentType,
    pub angle: f64,
    pub duration: Option<f64>,
}

impl PathState {
    pub fn new(
        position: Point3<f64>,
        velocity: f64,
        direction: Direction,
        segment_type: SegmentType,
    ) -> Self {
        Self {
            position,
            velocity,
            direction,
            segment_type,
            angle: 0.0,
            duration: None,
        }
    }

    pub fn from_state<S: PlannerState>(state: &S) -> Self {
        Self {
            position: state.position(),
            velocity: state.velocity(),
            direction: state.direction(),
            segment_type: state.segment_type(),
            angle: state.angle(),
            duration: state.duration(),
        }
    }
}

impl PlannerState for PathState {
    fn position(&self) -> Point3<f64> {
        self.position
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    fn angle(&self) -> f64 {
        self.angle
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

/// Reads planner output from a CSV file with the header `x,y,z,velocity,dir,type,angle,duration`.
/// `z` and `duration` may be left blank.
pub fn load_states<R: std::io::Read>(reader: R) -> Result<Vec<PathState>> {
    let mut states = Vec::new();
    for rec in csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
    {
        let rec: Record = rec?;
        states.push(PathState {
            position: Point3::new(rec.x, rec.y, rec.z.unwrap_or(0.0)),
            velocity: rec.velocity,
            direction: Direction::try_from(rec.dir)?,
            segment_type: rec.segment_type,
            angle: rec.angle,
            duration: rec.duration,
        });
    }
    debug!("Read {} planner states", states.len());
    Ok(states)
}

#[derive(Deserialize)]
struct Record {
    x: f64,
    y: f64,
    z: Option<f64>,
    velocity: f64,
    dir: i64,
    #[serde(rename = "type")]
    segment_type: SegmentType,
    angle: f64,
    duration: Option<f64>,
}
