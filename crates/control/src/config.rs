//! Controller configuration, loadable from JSON.
//!
//! Every field has a default, so `{}` is a valid configuration file.

use anyhow::{Context, Result};
use probe::{SpaceBounds, COIL_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SETTLE_MS: u64 = 250;
/// Step ceiling the external loop driver enforces per episode.
pub const DEFAULT_STEP_LIMIT: u32 = 2500;
pub const DEFAULT_IO_RETRIES: u32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Wait between actuation and sensing, in milliseconds.
    pub settle_ms: u64,
    pub step_limit: u32,
    /// Extra attempts per probe call before the failure is surfaced.
    pub io_retries: u32,
    /// Fixed seed for goal placement; fresh entropy per episode when absent.
    pub seed: Option<u64>,
    pub observation_bounds: SpaceBounds,
    pub action_bounds: SpaceBounds,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_MS,
            step_limit: DEFAULT_STEP_LIMIT,
            io_retries: DEFAULT_IO_RETRIES,
            seed: None,
            observation_bounds: SpaceBounds::observation(),
            action_bounds: SpaceBounds::action(),
        }
    }
}

impl ControllerConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, unknown keys, or bounds rejected by
    /// [`ControllerConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing controller config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads [`ControllerConfig::from_json`] input from a file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, or as [`ControllerConfig::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Checks both bound sets describe non-empty boxes of the right arity.
    ///
    /// # Errors
    ///
    /// Returns the first [`probe::BoundsError`] found.
    pub fn validate(&self) -> Result<()> {
        self.observation_bounds.validate().context("observation_bounds")?;
        self.observation_bounds.expect_dims(3).context("observation_bounds")?;
        self.action_bounds.validate().context("action_bounds")?;
        self.action_bounds
            .expect_dims(COIL_COUNT)
            .context("action_bounds")?;
        Ok(())
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
