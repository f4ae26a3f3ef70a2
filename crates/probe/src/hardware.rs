//! # Probe Driver Contract
//!
//! The episode controller never talks to coils or sensors directly. Everything
//! it needs from the rig goes through [`Probe`]: drive all coils at once, read
//! back the sensed position, and place a goal near where the probe currently
//! is. Implementations own the goal they placed so that
//! [`Probe::distance_to_goal`] can be answered without the controller.

use crate::distance::distance;
use crate::error::HwError;
use crate::types::{ControlVector, Position};

pub trait Probe {
    /// Commands every coil channel simultaneously.
    ///
    /// # Errors
    ///
    /// Returns an [`HwError`] when the command could not be delivered.
    fn set_actuation(&mut self, currents: &ControlVector) -> Result<(), HwError>;

    /// Samples the current sensed position.
    ///
    /// # Errors
    ///
    /// Returns an [`HwError`] when the sensor could not be read.
    fn read_position(&mut self) -> Result<Position, HwError>;

    /// Picks a new goal as a random deviation from the probe's reference
    /// position, stores it, and returns it.
    ///
    /// # Errors
    ///
    /// Returns an [`HwError`] if the reference position cannot be sensed.
    fn place_goal_relative(&mut self, rng: &mut fastrand::Rng) -> Result<Position, HwError>;

    /// Goal placed by the last call to [`Probe::place_goal_relative`].
    fn goal(&self) -> Option<Position>;

    /// Distance from a fresh sensor read to the stored goal.
    ///
    /// # Errors
    ///
    /// Returns [`HwError::NoGoal`] before any goal was placed, or the read
    /// error from [`Probe::read_position`].
    fn distance_to_goal(&mut self) -> Result<f64, HwError> {
        let goal = self.goal().ok_or(HwError::NoGoal)?;
        Ok(distance(self.read_position()?, goal))
    }
}
