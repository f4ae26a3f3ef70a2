use probe::{ControlVector, Position};
use std::collections::BTreeMap;

use crate::error::ControlError;

/// Free-form diagnostics attached to a step.
pub type Info = BTreeMap<String, serde_json::Value>;

/// Result of a single [`Env::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub observation: Position,
    pub reward: i32,
    pub terminated: bool,
    pub info: Info,
}

/// Episodic control environment.
///
/// Modelled on the classic Gym contract: [`reset`] starts an episode and
/// returns the first observation, each [`step`] applies one control vector and
/// reports the new observation, a reward and whether the episode is over.
/// Step ceilings are not part of the contract; the loop driving the
/// environment enforces them.
///
/// [`reset`]: Env::reset
/// [`step`]: Env::step
pub trait Env {
    /// Apply one action.
    ///
    /// # Errors
    ///
    /// Implementations surface hardware failures and cancellation as
    /// [`ControlError`].
    fn step(&mut self, action: &ControlVector) -> Result<StepOutcome, ControlError>;

    /// Start a new episode and return the initial observation.
    ///
    /// # Errors
    ///
    /// See [`Env::step`].
    fn reset(&mut self) -> Result<Position, ControlError>;

    /// Size of the observation vector.
    fn obs_size(&self) -> usize;

    /// Size of the action vector.
    fn action_size(&self) -> usize;
}
