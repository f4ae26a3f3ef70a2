//! # Settle Wait
//!
//! After the coils are driven the probe needs time to reach a new
//! quasi-steady orientation before it is worth sampling. The controller blocks
//! on a [`Settle`] implementation for that interval.
//!
//! [`CancellableSettle`] lets another thread abort an in-flight wait through a
//! [`CancelToken`]. The controller treats an aborted wait as a partial step:
//! the actuation command has already been issued, but the read-back is skipped.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("settle wait cancelled")]
pub struct Cancelled;

pub trait Settle {
    /// Blocks for `duration`, or until cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the wait was aborted before `duration` elapsed.
    fn settle(&self, duration: Duration) -> Result<(), Cancelled>;
}

/// Plain blocking sleep. Cannot be cancelled.
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepSettle;

impl Settle for SleepSettle {
    fn settle(&self, duration: Duration) -> Result<(), Cancelled> {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
        Ok(())
    }
}

#[derive(Default)]
struct TokenState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared cancellation flag. Once cancelled it stays cancelled until
/// [`CancelToken::rearm`] is called, so every wait started in between aborts
/// immediately.
#[derive(Clone, Default)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts current and future waits.
    pub fn cancel(&self) {
        *self.state.cancelled.lock() = true;
        self.state.wake.notify_all();
    }

    /// Clears the flag so new waits run to completion again.
    pub fn rearm(&self) {
        *self.state.cancelled.lock() = false;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock()
    }

    fn wait(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now() + duration;
        let mut cancelled = self.state.cancelled.lock();
        loop {
            if *cancelled {
                return Err(Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            // Spurious wakeups just go round the loop again.
            let _ = self.state.wake.wait_for(&mut cancelled, deadline - now);
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Settle wait that can be aborted through its [`CancelToken`].
#[derive(Clone, Debug, Default)]
pub struct CancellableSettle {
    token: CancelToken,
}

impl CancellableSettle {
    #[must_use]
    pub fn new(token: CancelToken) -> Self {
        Self { token }
    }

    #[must_use]
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Settle for CancellableSettle {
    fn settle(&self, duration: Duration) -> Result<(), Cancelled> {
        self.token.wait(duration)
    }
}
