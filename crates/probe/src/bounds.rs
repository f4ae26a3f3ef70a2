//! Per-axis numeric ranges published as observation and action space metadata.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ControlVector, Position, COIL_COUNT};

/// Default observation half-extent along each axis of the rig frame.
pub const OBSERVATION_LIMIT: f64 = 10.0;
/// Default current limit per coil, in amperes.
pub const CURRENT_LIMIT: f64 = 5.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("low has {low} axes but high has {high}")]
    LengthMismatch { low: usize, high: usize },
    #[error("axis {axis}: low {low} exceeds high {high}")]
    Inverted { axis: usize, low: f64, high: f64 },
    #[error("axis {axis} bound is not finite")]
    NonFinite { axis: usize },
    #[error("expected {expected} axes, got {actual}")]
    WrongArity { expected: usize, actual: usize },
}

/// Inclusive `[low, high]` interval per axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpaceBounds {
    pub per_axis_low: Vec<f64>,
    pub per_axis_high: Vec<f64>,
}

impl SpaceBounds {
    /// Creates bounds after checking they describe a non-empty box.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if the vectors differ in length, contain a
    /// non-finite value, or have `low > high` on some axis.
    pub fn new(per_axis_low: Vec<f64>, per_axis_high: Vec<f64>) -> Result<Self, BoundsError> {
        let bounds = Self { per_axis_low, per_axis_high };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Same symmetric interval `[-limit, limit]` on every axis.
    #[must_use]
    pub fn symmetric(axes: usize, limit: f64) -> Self {
        Self {
            per_axis_low: vec![-limit; axes],
            per_axis_high: vec![limit; axes],
        }
    }

    /// Default observation space: a cube around the rig origin.
    #[must_use]
    pub fn observation() -> Self {
        Self::symmetric(3, OBSERVATION_LIMIT)
    }

    /// Default action space: every coil within `±CURRENT_LIMIT`.
    #[must_use]
    pub fn action() -> Self {
        Self::symmetric(COIL_COUNT, CURRENT_LIMIT)
    }

    #[must_use]
    pub fn dims(&self) -> usize {
        self.per_axis_low.len()
    }

    /// # Errors
    ///
    /// See [`SpaceBounds::new`].
    pub fn validate(&self) -> Result<(), BoundsError> {
        if self.per_axis_low.len() != self.per_axis_high.len() {
            return Err(BoundsError::LengthMismatch {
                low: self.per_axis_low.len(),
                high: self.per_axis_high.len(),
            });
        }
        for (axis, (&low, &high)) in self.per_axis_low.iter().zip(&self.per_axis_high).enumerate() {
            if !low.is_finite() || !high.is_finite() {
                return Err(BoundsError::NonFinite { axis });
            }
            if low > high {
                return Err(BoundsError::Inverted { axis, low, high });
            }
        }
        Ok(())
    }

    /// Checks the dimensionality against what a space requires.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::WrongArity`] when `dims() != expected`.
    pub fn expect_dims(&self, expected: usize) -> Result<(), BoundsError> {
        if self.dims() == expected {
            Ok(())
        } else {
            Err(BoundsError::WrongArity { expected, actual: self.dims() })
        }
    }

    /// Whether every component lies inside its interval. NaN is never contained.
    #[must_use]
    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.dims()
            && values
                .iter()
                .zip(self.per_axis_low.iter().zip(&self.per_axis_high))
                .all(|(v, (low, high))| (low..=high).contains(&v))
    }

    #[must_use]
    pub fn contains_position(&self, p: Position) -> bool {
        self.contains(&p.to_array())
    }

    #[must_use]
    pub fn contains_action(&self, action: &ControlVector) -> bool {
        self.contains(action.as_slice())
    }

    /// Clamps `value` into the interval of `axis`. Axes outside the bounds are
    /// returned unchanged.
    #[must_use]
    pub fn clamp_axis(&self, axis: usize, value: f64) -> f64 {
        match (self.per_axis_low.get(axis), self.per_axis_high.get(axis)) {
            (Some(&low), Some(&high)) => value.max(low).min(high),
            _ => value,
        }
    }

    #[must_use]
    pub fn clamp_position(&self, p: Position) -> Position {
        Position::new(
            self.clamp_axis(0, p.x),
            self.clamp_axis(1, p.y),
            self.clamp_axis(2, p.z),
        )
    }

    /// Uniform sample inside the box.
    #[must_use]
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Vec<f64> {
        self.per_axis_low
            .iter()
            .zip(&self.per_axis_high)
            .map(|(low, high)| low + rng.f64() * (high - low))
            .collect()
    }
}
