use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HwError;

/// Number of independently driven electromagnet coils on the probe rig.
pub const COIL_COUNT: usize = 9;

/// Sensed (or targeted) probe coordinate in the rig frame.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Component-wise offset.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl From<[f64; 3]> for Position {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// One simultaneous set of coil currents, one entry per coil.
///
/// Construction only checks arity. Finiteness is a property the controller
/// inspects per step, because a non-finite command must still be accepted as
/// an (invalid) step rather than rejected before it reaches the episode loop.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlVector(pub [f64; COIL_COUNT]);

impl ControlVector {
    pub const ZERO: Self = Self([0.0; COIL_COUNT]);

    #[must_use]
    pub const fn new(currents: [f64; COIL_COUNT]) -> Self {
        Self(currents)
    }

    /// Same current on every coil.
    #[must_use]
    pub const fn splat(current: f64) -> Self {
        Self([current; COIL_COUNT])
    }

    /// Builds a vector from a slice, rejecting the wrong number of channels.
    ///
    /// # Errors
    ///
    /// Returns [`HwError::ArityMismatch`] if `values.len() != COIL_COUNT`.
    pub fn from_slice(values: &[f64]) -> Result<Self, HwError> {
        let currents: [f64; COIL_COUNT] =
            values.try_into().map_err(|_| HwError::ArityMismatch {
                expected: COIL_COUNT,
                actual: values.len(),
            })?;
        Ok(Self(currents))
    }

    /// Index of the first NaN or infinite component, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.0.iter().position(|c| !c.is_finite())
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Default for ControlVector {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<&[f64]> for ControlVector {
    type Error = HwError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        Self::from_slice(values)
    }
}

impl TryFrom<&[f32]> for ControlVector {
    type Error = HwError;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
        let widened: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
        Self::from_slice(&widened)
    }
}
