//! # Episode Controller
//!
//! Drives one episode of the sense, act, score loop against a [`Probe`]:
//!
//! 1.  [`EpisodeController::reset`] senses the start position, re-seeds the
//!     goal sampler and has the probe place a goal near that position.
//! 2.  [`EpisodeController::step`] validates the control vector, drives the
//!     coils, blocks for the settle interval, senses again and scores the
//!     change in distance to the goal with [`reward`].
//!
//! The controller owns the only [`EpisodeState`]. A failed or cancelled step
//! leaves it exactly as it was before the call.

use probe::{distance, ControlVector, HwError, Position, Probe, SpaceBounds, COIL_COUNT};
use std::sync::Arc;
use tracing::warn;

use crate::config::ControllerConfig;
use crate::env::{Env, Info, StepOutcome};
use crate::error::ControlError;
use crate::reward::{is_terminal, reward, REWARD_UNCHANGED};
use crate::settle::{Settle, SleepSettle};
use crate::sink::{Event, EventSink, TracingSink};

/// Info key set on the outcome of a step whose action was not finite.
pub const INFO_INVALID_ACTION: &str = "invalid_action";

/// Running state of the current episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeState {
    pub current_position: Position,
    pub goal_position: Position,
    /// Distance before the last scored step; `None` until the first one.
    pub previous_distance: Option<f64>,
    /// Distance from `current_position` to `goal_position`.
    pub current_distance: f64,
    /// Distance at reset, kept for diagnostics.
    pub initial_distance: f64,
    pub step_limit: u32,
    /// Steps taken this episode, including invalid ones.
    pub steps: u32,
}

impl EpisodeState {
    fn new(position: Position, goal: Position, step_limit: u32) -> Self {
        let d = distance(position, goal);
        Self {
            current_position: position,
            goal_position: goal,
            previous_distance: None,
            current_distance: d,
            initial_distance: d,
            step_limit,
            steps: 0,
        }
    }

    /// Moves to a freshly sensed position and returns the step reward.
    fn advance(&mut self, position: Position) -> i32 {
        let previous = self.current_distance;
        self.previous_distance = Some(previous);
        self.current_position = position;
        self.current_distance = distance(position, self.goal_position);
        reward(previous, self.current_distance)
    }

    /// Whether the driver should stop this episode on step count.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.steps >= self.step_limit
    }
}

pub struct EpisodeController<P: Probe> {
    probe: P,
    config: ControllerConfig,
    settle: Box<dyn Settle + Send>,
    sink: Arc<dyn EventSink>,
    rng: fastrand::Rng,
    state: Option<EpisodeState>,
    episode: u64,
}

impl<P: Probe> EpisodeController<P> {
    /// Creates a controller that sleeps for the settle interval and reports to
    /// `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Bounds`] if the configured bounds are malformed
    /// or have the wrong number of axes.
    pub fn new(probe: P, config: ControllerConfig) -> Result<Self, ControlError> {
        config.observation_bounds.validate()?;
        config.observation_bounds.expect_dims(3)?;
        config.action_bounds.validate()?;
        config.action_bounds.expect_dims(COIL_COUNT)?;
        let rng = seeded_rng(config.seed, 0);
        Ok(Self {
            probe,
            config,
            settle: Box::new(SleepSettle),
            sink: Arc::new(TracingSink),
            rng,
            state: None,
            episode: 0,
        })
    }

    #[must_use]
    pub fn with_settle(mut self, settle: impl Settle + Send + 'static) -> Self {
        self.settle = Box::new(settle);
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Starts a new episode and returns the sensed start position.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Hardware`] once the sensor read or goal
    /// placement has failed `io_retries + 1` times. The previous episode's
    /// state and goal sampler are kept, unless the failed placement left the
    /// probe holding a different goal; then the episode is dropped and
    /// [`step`](Self::step) returns [`ControlError::NotReset`] until the next
    /// successful reset.
    pub fn reset(&mut self) -> Result<Position, ControlError> {
        let episode = self.episode + 1;
        let mut rng = match self.config.seed {
            Some(_) => seeded_rng(self.config.seed, episode),
            None => fastrand::Rng::with_seed(self.rng.u64(..)),
        };

        let retries = self.config.io_retries;
        let sink = self.sink.as_ref();
        let position = with_retries(&mut self.probe, sink, retries, "read_position", P::read_position)?;
        let placed = with_retries(&mut self.probe, sink, retries, "place_goal", |p| {
            p.place_goal_relative(&mut rng)
        });
        let goal = match placed {
            Ok(goal) => goal,
            Err(error) => {
                let kept_goal = self.state.as_ref().map(|s| s.goal_position);
                if kept_goal.is_some() && self.probe.goal() != kept_goal {
                    warn!(episode = self.episode, "probe goal diverged after failed reset; episode dropped");
                    self.state = None;
                }
                return Err(error);
            }
        };

        self.rng = rng;
        let state = EpisodeState::new(position, goal, self.config.step_limit);
        self.sink.log(&Event::EpisodeStarted {
            episode,
            seed: self.config.seed,
            goal,
            position,
            initial_distance: state.initial_distance,
        });
        self.state = Some(state);
        self.episode = episode;
        Ok(position)
    }

    /// Applies one control vector and scores the result.
    ///
    /// An action with a NaN or infinite component is not sent to the probe.
    /// The step still counts, an unseeded goal sampler is re-seeded from
    /// fresh entropy, and the outcome
    /// repeats the last observation with reward 0 and an
    /// [`INFO_INVALID_ACTION`] entry naming the offending channel.
    ///
    /// # Errors
    ///
    /// - [`ControlError::NotReset`] before the first [`reset`](Self::reset).
    /// - [`ControlError::Hardware`] when actuation or read-back keeps failing.
    /// - [`ControlError::Cancelled`] when the settle wait was aborted. The
    ///   coils have been driven but nothing was sensed or scored.
    pub fn step(&mut self, action: &ControlVector) -> Result<StepOutcome, ControlError> {
        let (last_position, step) = match &self.state {
            Some(state) => (state.current_position, state.steps + 1),
            None => return Err(ControlError::NotReset),
        };
        let episode = self.episode;

        if let Some(channel) = action.first_non_finite() {
            if self.config.seed.is_none() {
                self.rng = fastrand::Rng::new();
            }
            if let Some(state) = self.state.as_mut() {
                state.steps = step;
            }
            self.sink.log(&Event::InvalidAction { episode, step, channel });
            let mut info = Info::new();
            info.insert(INFO_INVALID_ACTION.to_string(), channel.into());
            return Ok(StepOutcome {
                observation: last_position,
                reward: REWARD_UNCHANGED,
                terminated: false,
                info,
            });
        }

        let retries = self.config.io_retries;
        let sink = self.sink.as_ref();
        with_retries(&mut self.probe, sink, retries, "set_actuation", |p| p.set_actuation(action))?;
        sink.log(&Event::ActionApplied { episode, step, action: *action });

        if self.settle.settle(self.config.settle()).is_err() {
            sink.log(&Event::StepCancelled { episode, step });
            return Err(ControlError::Cancelled);
        }

        let position = with_retries(&mut self.probe, sink, retries, "read_position", P::read_position)?;

        let Some(state) = self.state.as_mut() else {
            return Err(ControlError::NotReset);
        };
        state.steps = step;
        let previous_distance = state.current_distance;
        let reward = state.advance(position);
        let terminated = is_terminal(reward);
        self.sink.log(&Event::StepScored {
            episode,
            step,
            position,
            previous_distance,
            distance: state.current_distance,
            reward,
            terminated,
        });

        Ok(StepOutcome {
            observation: position,
            reward,
            terminated,
            info: Info::new(),
        })
    }

    /// Asks the probe itself how far it is from its goal, with a fresh read.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Hardware`] if the probe keeps failing.
    pub fn probe_distance_to_goal(&mut self) -> Result<f64, ControlError> {
        with_retries(
            &mut self.probe,
            self.sink.as_ref(),
            self.config.io_retries,
            "distance_to_goal",
            P::distance_to_goal,
        )
    }

    #[must_use]
    pub fn state(&self) -> Option<&EpisodeState> {
        self.state.as_ref()
    }

    /// Number of episodes started so far.
    #[must_use]
    pub fn episode(&self) -> u64 {
        self.episode
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.state.as_ref().is_some_and(EpisodeState::is_truncated)
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn observation_bounds(&self) -> &SpaceBounds {
        &self.config.observation_bounds
    }

    #[must_use]
    pub fn action_bounds(&self) -> &SpaceBounds {
        &self.config.action_bounds
    }

    #[must_use]
    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }
}

impl<P: Probe> Env for EpisodeController<P> {
    fn step(&mut self, action: &ControlVector) -> Result<StepOutcome, ControlError> {
        EpisodeController::step(self, action)
    }

    fn reset(&mut self) -> Result<Position, ControlError> {
        EpisodeController::reset(self)
    }

    fn obs_size(&self) -> usize {
        3
    }

    fn action_size(&self) -> usize {
        COIL_COUNT
    }
}

/// Fresh entropy, or a seed derived from the configured one so that each
/// episode samples differently but reproducibly.
fn seeded_rng(seed: Option<u64>, salt: u64) -> fastrand::Rng {
    match seed {
        Some(seed) => fastrand::Rng::with_seed(seed.wrapping_add(salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))),
        None => fastrand::Rng::new(),
    }
}

/// Calls the probe up to `retries + 1` times, logging every failure.
fn with_retries<P, T>(
    probe: &mut P,
    sink: &dyn EventSink,
    retries: u32,
    operation: &str,
    mut call: impl FnMut(&mut P) -> Result<T, HwError>,
) -> Result<T, ControlError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match call(probe) {
            Ok(value) => return Ok(value),
            Err(error) => {
                sink.log(&Event::HardwareRetry {
                    operation: operation.to_string(),
                    attempt,
                    error: error.to_string(),
                });
                if attempt > retries {
                    return Err(ControlError::Hardware { attempts: attempt, source: error });
                }
            }
        }
    }
}
