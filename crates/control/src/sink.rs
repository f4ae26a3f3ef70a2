//! # Observability Sinks
//!
//! The controller reports lifecycle [`Event`]s to an injected [`EventSink`]
//! instead of configuring process-wide logging itself. Sinks must never fail
//! the control loop; write errors are reported through `tracing` and dropped.

use parking_lot::Mutex;
use probe::{ControlVector, Position};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something worth recording about an episode.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    EpisodeStarted {
        episode: u64,
        seed: Option<u64>,
        goal: Position,
        position: Position,
        initial_distance: f64,
    },
    ActionApplied {
        episode: u64,
        step: u32,
        action: ControlVector,
    },
    InvalidAction {
        episode: u64,
        step: u32,
        channel: usize,
    },
    StepScored {
        episode: u64,
        step: u32,
        position: Position,
        previous_distance: f64,
        distance: f64,
        reward: i32,
        terminated: bool,
    },
    HardwareRetry {
        operation: String,
        attempt: u32,
        error: String,
    },
    StepCancelled {
        episode: u64,
        step: u32,
    },
}

pub trait EventSink: Send + Sync {
    fn log(&self, event: &Event);
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log(&self, event: &Event) {
        match event {
            Event::EpisodeStarted { episode, seed, goal, position, initial_distance } => {
                info!(episode, ?seed, %goal, %position, initial_distance, "episode started");
            }
            Event::ActionApplied { episode, step, action } => {
                debug!(episode, step, action = ?action.0, "action applied");
            }
            Event::InvalidAction { episode, step, channel } => {
                warn!(episode, step, channel, "non-finite action component, actuation skipped");
            }
            Event::StepScored { episode, step, position, previous_distance, distance, reward, terminated } => {
                debug!(episode, step, %position, previous_distance, distance, reward, terminated, "step scored");
            }
            Event::HardwareRetry { operation, attempt, error } => {
                warn!(operation = %operation, attempt, error = %error, "probe call failed");
            }
            Event::StepCancelled { episode, step } => {
                warn!(episode, step, "settle wait cancelled, read-back skipped");
            }
        }
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn log(&self, event: &Event) {
        let mut out = self.out.lock();
        let written = serde_json::to_writer(&mut *out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            warn!("dropping event, log write failed: {e}");
        }
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for RecordingSink {
    fn log(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// Sends every event to each inner sink, in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn log(&self, event: &Event) {
        for sink in &self.sinks {
            sink.log(event);
        }
    }
}
