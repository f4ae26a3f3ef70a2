//! Mutex-serialized probe handle.
//!
//! The rig is a single exclusive resource. Cloning a [`SharedProbe`] hands out
//! another handle to the same driver; every call locks the driver for its
//! whole duration, so two callers can never interleave coil writes and sensor
//! reads.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use crate::error::HwError;
use crate::hardware::Probe;
use crate::types::{ControlVector, Position};

pub struct SharedProbe<P> {
    inner: Arc<Mutex<P>>,
}

impl<P> Clone for SharedProbe<P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<P: Probe> SharedProbe<P> {
    #[must_use]
    pub fn new(probe: P) -> Self {
        Self { inner: Arc::new(Mutex::new(probe)) }
    }

    /// Locks the driver for a multi-call transaction.
    pub fn lock(&self) -> MutexGuard<'_, P> {
        self.inner.lock()
    }

    /// Number of live handles to the driver.
    #[must_use]
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<P: Probe> Probe for SharedProbe<P> {
    fn set_actuation(&mut self, currents: &ControlVector) -> Result<(), HwError> {
        self.inner.lock().set_actuation(currents)
    }

    fn read_position(&mut self) -> Result<Position, HwError> {
        self.inner.lock().read_position()
    }

    fn place_goal_relative(&mut self, rng: &mut fastrand::Rng) -> Result<Position, HwError> {
        self.inner.lock().place_goal_relative(rng)
    }

    fn goal(&self) -> Option<Position> {
        self.inner.lock().goal()
    }

    fn distance_to_goal(&mut self) -> Result<f64, HwError> {
        self.inner.lock().distance_to_goal()
    }
}
