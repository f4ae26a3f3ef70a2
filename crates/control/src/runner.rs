//! # Episode Runner
//!
//! The loop driver that sits above an [`Env`]: reset, query a [`Policy`] for
//! each action, step until the environment reports termination or the step
//! ceiling is reached. The environment never enforces the ceiling itself.

use probe::{ControlVector, Position, SpaceBounds};
use serde::Serialize;
use tracing::info;

use crate::controller::INFO_INVALID_ACTION;
use crate::env::Env;
use crate::error::ControlError;

/// Maps the latest observation to the next control vector.
pub trait Policy {
    fn act(&mut self, observation: &Position) -> ControlVector;
}

impl<F: FnMut(&Position) -> ControlVector> Policy for F {
    fn act(&mut self, observation: &Position) -> ControlVector {
        self(observation)
    }
}

/// Uniformly random currents inside the action bounds.
pub struct RandomPolicy {
    rng: fastrand::Rng,
    bounds: SpaceBounds,
}

impl RandomPolicy {
    #[must_use]
    pub fn new(bounds: SpaceBounds, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self { rng, bounds }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _observation: &Position) -> ControlVector {
        let sample = self.bounds.sample(&mut self.rng);
        ControlVector::from_slice(&sample).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub steps: u32,
    pub total_reward: i64,
    /// The goal was reached.
    pub terminated: bool,
    /// The step ceiling was hit first.
    pub truncated: bool,
    pub invalid_actions: u32,
    pub final_observation: Position,
}

/// Runs one episode from reset to termination or `step_limit` steps.
///
/// # Errors
///
/// Propagates the first [`ControlError`] from the environment; the episode is
/// abandoned at that point.
pub fn run_episode<E: Env + ?Sized>(
    env: &mut E,
    step_limit: u32,
    policy: &mut impl Policy,
) -> Result<EpisodeSummary, ControlError> {
    let mut observation = env.reset()?;
    let mut summary = EpisodeSummary {
        final_observation: observation,
        ..EpisodeSummary::default()
    };

    while summary.steps < step_limit {
        let action = policy.act(&observation);
        let outcome = env.step(&action)?;
        summary.steps += 1;
        summary.total_reward += i64::from(outcome.reward);
        if outcome.info.contains_key(INFO_INVALID_ACTION) {
            summary.invalid_actions += 1;
        }
        observation = outcome.observation;
        summary.final_observation = observation;
        if outcome.terminated {
            summary.terminated = true;
            break;
        }
    }
    summary.truncated = !summary.terminated;

    info!(
        steps = summary.steps,
        total_reward = summary.total_reward,
        terminated = summary.terminated,
        "episode finished"
    );
    Ok(summary)
}
