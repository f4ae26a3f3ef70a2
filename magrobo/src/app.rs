//! # MagRobo Application Logic
//!
//! Wires a [`SimulatedProbe`] behind a [`SharedProbe`] handle into an
//! [`EpisodeController`], then runs the requested number of episodes with
//! [`control::run_episode`]. Lifecycle events go both to `tracing` and to a
//! timestamped JSON-lines file under the log directory.

use anyhow::{Context, Result};
use chrono::Local;
use control::{
    run_episode, ControllerConfig, EpisodeController, EpisodeSummary, EventSink, FanoutSink,
    JsonLinesSink, Policy, RandomPolicy, TracingSink,
};
use probe::{ControlVector, Position, Probe, SharedProbe, SimulatedProbe};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::{Args, PolicyKind};

/// Commands the simulated plant straight onto its current goal.
struct SeekPolicy {
    rig: SharedProbe<SimulatedProbe>,
}

impl Policy for SeekPolicy {
    fn act(&mut self, _observation: &Position) -> ControlVector {
        let sim = self.rig.lock();
        sim.goal()
            .and_then(|goal| sim.command_for(goal))
            .unwrap_or_default()
    }
}

enum DrivingPolicy {
    Random(RandomPolicy),
    Seek(SeekPolicy),
}

impl Policy for DrivingPolicy {
    fn act(&mut self, observation: &Position) -> ControlVector {
        match self {
            DrivingPolicy::Random(p) => p.act(observation),
            DrivingPolicy::Seek(p) => p.act(observation),
        }
    }
}

/// Layers command-line overrides on top of the file (or default) config.
///
/// # Errors
///
/// Fails if the config file cannot be read or is invalid.
pub fn resolve_config(args: &Args) -> Result<ControllerConfig> {
    let mut config = match &args.config {
        Some(path) => ControllerConfig::from_path(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(settle_ms) = args.settle_ms {
        config.settle_ms = settle_ms;
    }
    if let Some(step_limit) = args.step_limit {
        config.step_limit = step_limit;
    }
    Ok(config)
}

/// `<dir>/magrobo_<YYYYmmdd-HHMMSS>.jsonl`
#[must_use]
pub fn log_file_path(dir: &Path) -> PathBuf {
    dir.join(format!("magrobo_{}.jsonl", Local::now().format("%Y%m%d-%H%M%S")))
}

/// Runs every requested episode and returns their summaries.
///
/// # Errors
///
/// Fails on configuration or log-file problems, or when the controller
/// surfaces an unrecoverable probe error.
pub fn run(args: &Args) -> Result<Vec<EpisodeSummary>> {
    let config = resolve_config(args)?;

    fs::create_dir_all(&args.log_dir)
        .with_context(|| format!("creating log directory {}", args.log_dir.display()))?;
    let log_path = log_file_path(&args.log_dir);
    let log_file = File::create(&log_path)
        .with_context(|| format!("creating event log {}", log_path.display()))?;
    let sink: Arc<dyn EventSink> = Arc::new(
        FanoutSink::default()
            .with(Arc::new(TracingSink))
            .with(Arc::new(JsonLinesSink::new(BufWriter::new(log_file)))),
    );
    info!("Event log: {}", log_path.display());

    let rig = SharedProbe::new(
        SimulatedProbe::new()
            .with_bounds(config.observation_bounds.clone(), config.action_bounds.clone()),
    );
    let step_limit = config.step_limit;
    let mut policy = match args.policy {
        PolicyKind::Random => {
            DrivingPolicy::Random(RandomPolicy::new(config.action_bounds.clone(), config.seed))
        }
        PolicyKind::Seek => DrivingPolicy::Seek(SeekPolicy { rig: rig.clone() }),
    };
    let mut controller = EpisodeController::new(rig, config)?.with_sink(sink);

    info!(
        "Starting {} episode(s), step limit {}, settle {} ms",
        args.episodes,
        step_limit,
        controller.config().settle_ms
    );
    let mut summaries = Vec::new();
    for episode in 1..=args.episodes {
        let summary = run_episode(&mut controller, step_limit, &mut policy)
            .with_context(|| format!("episode {episode}"))?;
        match controller.probe_distance_to_goal() {
            Ok(d) => info!(
                "Episode {} done: {} steps, reward {}, terminated {}, final distance {:.3}",
                episode, summary.steps, summary.total_reward, summary.terminated, d
            ),
            Err(e) => warn!("Episode {} done but final distance unavailable: {e}", episode),
        }
        summaries.push(summary);
    }

    let reached = summaries.iter().filter(|s| s.terminated).count();
    info!("Finished: {}/{} episodes reached the goal", reached, summaries.len());
    Ok(summaries)
}
