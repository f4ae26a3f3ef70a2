#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # MagRobo Episode Control
//!
//! Turns a magnetic probe rig into an episodic decision process.
//!
//! ## Key Components
//!
//! -   **[`EpisodeController`]:** owns the episode state, validates actions,
//!     drives the [`probe::Probe`], waits for the plant to settle and scores
//!     each step with [`reward()`]. It implements the Gym-style [`Env`] trait.
//! -   **Settle:** [`SleepSettle`] and the cancellable [`CancellableSettle`]
//!     implement the blocking wait between actuation and sensing.
//! -   **Observability:** lifecycle [`Event`]s go to an injected
//!     [`EventSink`] ([`TracingSink`], [`JsonLinesSink`], [`RecordingSink`],
//!     [`FanoutSink`]).
//! -   **Configuration:** [`ControllerConfig`] with JSON loading.
//! -   **Runner:** [`run_episode`] is the outer loop that enforces the step
//!     ceiling.
//!
//! ## Usage
//!
//! ```rust
//! use control::{ControllerConfig, EpisodeController};
//! use probe::{ControlVector, SimulatedProbe};
//!
//! let config = ControllerConfig { settle_ms: 0, seed: Some(1), ..ControllerConfig::default() };
//! let mut env = EpisodeController::new(SimulatedProbe::new(), config)?;
//! let start = env.reset()?;
//! let outcome = env.step(&ControlVector::ZERO)?;
//! assert_eq!(outcome.observation, start);
//! # Ok::<(), control::ControlError>(())
//! ```

pub mod config;
pub mod controller;
pub mod env;
pub mod error;
pub mod reward;
pub mod runner;
pub mod settle;
pub mod sink;

pub use config::ControllerConfig;
pub use controller::{EpisodeController, EpisodeState, INFO_INVALID_ACTION};
pub use env::{Env, Info, StepOutcome};
pub use error::ControlError;
pub use reward::{is_terminal, reward};
pub use runner::{run_episode, EpisodeSummary, Policy, RandomPolicy};
pub use settle::{CancelToken, Cancelled, CancellableSettle, Settle, SleepSettle};
pub use sink::{Event, EventSink, FanoutSink, JsonLinesSink, RecordingSink, TracingSink};
