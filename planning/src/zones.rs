use anyhow::Result;

use trajectory::{AnnotationKind, GeoPoint, Trajectory};

use crate::{Direction, PlannerState, SegmentType};

/// The zone label covering swaths
pub const WORK_ZONE: &str = "work";
/// The zone label covering turns between swaths
pub const TURN_ZONE: &str = "uturn";

/// Turns a sequence of planner states into a trajectory, one state at a time. Reversing starts a
/// new section, and switching between swaths and turns closes one zone and opens the other.
pub struct ZoneAnnotator {
    prev_dir: Option<Direction>,
    prev_type: SegmentType,
    // The index the next state will get
    idx: usize,
}

impl Default for ZoneAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneAnnotator {
    pub fn new() -> Self {
        Self {
            prev_dir: None,
            prev_type: SegmentType::Turn,
            idx: 0,
        }
    }

    /// The trajectory needs x, y and speed columns. Speed is stored signed, negative in reverse.
    pub fn push<S: PlannerState>(&mut self, traj: &mut Trajectory, state: &S) -> Result<()> {
        let dir = state.direction();
        if self.prev_dir.map(|prev| prev != dir).unwrap_or(false) {
            traj.append_section::<[f64; 3]>(&[])?;
        }

        let segment_type = state.segment_type();
        if segment_type != self.prev_type {
            let (exit, enter) = match segment_type {
                SegmentType::Turn => (WORK_ZONE, TURN_ZONE),
                SegmentType::Swath => (TURN_ZONE, WORK_ZONE),
            };
            if self.idx > 0 {
                traj.append_annotation(AnnotationKind::ZoneExit, exit, self.idx - 1);
            }
            traj.append_annotation(AnnotationKind::ZoneEnter, enter, self.idx);
        }

        let pos = state.position();
        traj.append_point(&[pos.x, pos.y, state.velocity() * dir.sign()])?;

        self.prev_dir = Some(dir);
        self.prev_type = segment_type;
        self.idx += 1;
        Ok(())
    }

    /// Closes the work zone on the last state. Paths that end in a turn are left unbalanced.
    pub fn finish(self, traj: &mut Trajectory) {
        if self.idx > 0 {
            traj.append_annotation(AnnotationKind::ZoneExit, WORK_ZONE, self.idx - 1);
        }
    }
}

/// Builds an annotated trajectory with columns x, y and speed from all of the states.
pub fn annotate<S: PlannerState>(states: &[S], anchor: GeoPoint) -> Result<Trajectory> {
    let mut traj = Trajectory::new(
        vec!["x".to_string(), "y".to_string(), "speed".to_string()],
        anchor,
    )?;
    let mut annotator = ZoneAnnotator::new();
    for state in states {
        annotator.push(&mut traj, state)?;
    }
    annotator.finish(&mut traj);
    debug!(
        "Annotated {} states into {} sections with {} zone markers",
        traj.len(),
        traj.num_sections(),
        traj.annotations().len()
    );
    Ok(traj)
}
