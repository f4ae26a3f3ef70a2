//! Command-line options for the `magrobo` runtime.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which controller drives the coils during an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Uniformly random currents inside the action bounds.
    Random,
    /// Solve the simulated plant for the goal and command it directly.
    Seek,
}

#[derive(Debug, Parser)]
#[command(name = "magrobo", about = "Run goal-seeking episodes against the simulated magnetic probe")]
pub struct Args {
    /// Number of episodes to run.
    #[arg(long, default_value_t = 1)]
    pub episodes: u32,

    /// Fixed seed for goal placement and the random policy.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Settle interval between actuation and read-back, overrides the config.
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Step ceiling per episode, overrides the config.
    #[arg(long)]
    pub step_limit: Option<u32>,

    /// JSON controller configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the JSON-lines event log.
    #[arg(long, default_value = "log")]
    pub log_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
    pub policy: PolicyKind,

    /// `tracing` filter directive, e.g. `info` or `control=debug`.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
