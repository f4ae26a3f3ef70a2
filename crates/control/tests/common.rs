#![allow(dead_code)]

use control::{ControllerConfig, EpisodeController, RecordingSink};
use probe::{ControlVector, HwError, Position, Probe};
use std::collections::VecDeque;
use std::sync::Arc;

/// Probe that replays a fixed list of sensor readings.
///
/// The goal is fixed unless `next_goal` is set; once the script runs out the
/// last reading repeats.
#[derive(Default)]
pub struct ScriptedProbe {
    pub goal: Position,
    pub readings: VecDeque<Result<Position, HwError>>,
    pub last: Position,
    pub actuations: Vec<ControlVector>,
    pub actuation_faults: u32,
    /// Goal placements that fail after retries run out.
    pub goal_faults: u32,
    /// Goal the rig latches on its next placement, even a failing one.
    pub next_goal: Option<Position>,
}

impl ScriptedProbe {
    pub fn new(goal: Position, readings: &[Position]) -> Self {
        Self {
            goal,
            readings: readings.iter().copied().map(Ok).collect(),
            ..Self::default()
        }
    }

    pub fn push_fault(&mut self, error: HwError) {
        self.readings.push_back(Err(error));
    }
}

impl Probe for ScriptedProbe {
    fn set_actuation(&mut self, currents: &ControlVector) -> Result<(), HwError> {
        if self.actuation_faults > 0 {
            self.actuation_faults -= 1;
            return Err(HwError::Disconnected);
        }
        self.actuations.push(*currents);
        Ok(())
    }

    fn read_position(&mut self) -> Result<Position, HwError> {
        match self.readings.pop_front() {
            Some(Ok(p)) => {
                self.last = p;
                Ok(p)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last),
        }
    }

    fn place_goal_relative(&mut self, _rng: &mut fastrand::Rng) -> Result<Position, HwError> {
        if let Some(goal) = self.next_goal.take() {
            self.goal = goal;
        }
        if self.goal_faults > 0 {
            self.goal_faults -= 1;
            return Err(HwError::Disconnected);
        }
        Ok(self.goal)
    }

    fn goal(&self) -> Option<Position> {
        Some(self.goal)
    }
}

pub fn fast_config() -> ControllerConfig {
    ControllerConfig {
        settle_ms: 0,
        seed: Some(1234),
        ..ControllerConfig::default()
    }
}

pub fn scripted(
    goal: Position,
    readings: &[Position],
) -> (EpisodeController<ScriptedProbe>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let controller = EpisodeController::new(ScriptedProbe::new(goal, readings), fast_config())
        .unwrap()
        .with_sink(sink.clone());
    (controller, sink)
}

/// A point on the x axis at distance `d` from the origin.
pub fn at(d: f64) -> Position {
    Position::new(d, 0.0, 0.0)
}
