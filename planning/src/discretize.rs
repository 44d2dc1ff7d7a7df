use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{PathState, PlannerState};

/// Resamples planner output so consecutive states are at most `step_size` apart, measured in the
/// xy plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    /// Meters
    pub step_size: f64,
    /// Pairs up to `step_size + step_tolerance` apart are left alone
    #[serde(default = "default_step_tolerance")]
    pub step_tolerance: f64,
    /// States closer than this to the previous one are dropped
    #[serde(default = "default_duplicate_tolerance")]
    pub duplicate_tolerance: f64,
}

fn default_step_tolerance() -> f64 {
    1e-9
}

fn default_duplicate_tolerance() -> f64 {
    1e-6
}

impl Discretizer {
    pub fn new(step_size: f64) -> Self {
        Self {
            step_size,
            step_tolerance: default_step_tolerance(),
            duplicate_tolerance: default_duplicate_tolerance(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            bail!("step_size must be positive, not {}", self.step_size);
        }
        for (name, x) in [
            ("step_tolerance", self.step_tolerance),
            ("duplicate_tolerance", self.duplicate_tolerance),
        ] {
            if !x.is_finite() || x < 0.0 {
                bail!("{} must be zero or more, not {}", name, x);
            }
        }
        Ok(())
    }

    /// Every pair of states further apart than the step is split into `ceil(distance / step)`
    /// equal pieces. The inserted states copy everything but the position from the first state of
    /// the pair, and z is interpolated along with x and y.
    ///
    /// A state on top of the previous one isn't emitted, but the walk onwards from there uses its
    /// attributes. So a turn starting exactly where a swath ends still produces turn states.
    ///
    /// Each state gets the time to reach its successor, and the last one the time it took to get
    /// there. A lone state has no duration.
    pub fn discretize<S: PlannerState>(&self, states: &[S]) -> Result<Vec<PathState>> {
        self.validate()?;
        let mut states = states.iter().map(PathState::from_state);
        let mut p0 = match states.next() {
            Some(x) => x,
            None => return Ok(Vec::new()),
        };

        let mut output: Vec<PathState> = Vec::new();
        // True when p0's position is already the last output
        let mut emitted = false;
        let mut prev_duration = None;
        let mut duplicates = 0;
        for p1 in states {
            let delta = p1.position - p0.position;
            let dist = delta.x.hypot(delta.y);
            if dist < self.duplicate_tolerance {
                duplicates += 1;
                if !emitted {
                    let mut end = p0.clone();
                    end.duration = prev_duration;
                    output.push(end);
                    emitted = true;
                }
                p0 = PathState {
                    position: p0.position,
                    ..p1
                };
                continue;
            }

            let steps = if dist <= self.step_size + self.step_tolerance {
                1
            } else {
                (dist / self.step_size).ceil() as usize
            };
            let duration = step_duration(&p0, dist, steps);

            if emitted {
                if let Some(last) = output.last_mut() {
                    last.duration = duration;
                }
            } else {
                let mut start = p0.clone();
                start.duration = duration;
                output.push(start);
            }
            for i in 1..steps {
                let pct = i as f64 / steps as f64;
                let mut state = p0.clone();
                state.position = p0.position + delta * pct;
                state.duration = duration;
                output.push(state);
            }
            p0 = p1;
            emitted = false;
            prev_duration = duration;
        }
        if !emitted {
            p0.duration = prev_duration;
            output.push(p0);
        }

        if duplicates > 0 {
            debug!("Dropped {} duplicate states while discretizing", duplicates);
        }
        Ok(output)
    }
}

fn step_duration(from: &PathState, dist: f64, steps: usize) -> Option<f64> {
    let speed = from.velocity.abs();
    if speed > 0.0 {
        Some(dist / (steps as f64 * speed))
    } else {
        from.duration.map(|d| d / steps as f64)
    }
}
