#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # MagRobo Probe Layer
//!
//! Everything the episode controller knows about the magnetic rig lives here.
//!
//! ## Key Components
//!
//! -   **Values:** [`Position`] is a sensed rig coordinate and
//!     [`ControlVector`] one current per coil ([`COIL_COUNT`] of them).
//! -   **Distance Evaluator:** [`distance`] is the Euclidean metric that all
//!     reward shaping is based on.
//! -   **Driver contract:** the [`Probe`] trait is the seam between the
//!     controller and real hardware. [`SharedProbe`] serializes access when
//!     more than one caller holds the rig.
//! -   **Simulation:** [`SimulatedProbe`] is a quasi-static linear plant used
//!     by the runtime binary and the test suites.
//! -   **Bounds:** [`SpaceBounds`] publishes observation and action ranges.
//!
//! ## Usage
//!
//! ```rust
//! use probe::{ControlVector, Probe, SimulatedProbe};
//!
//! let mut rig = SimulatedProbe::new();
//! rig.set_actuation(&ControlVector::splat(1.0))?;
//! let p = rig.read_position()?;
//! assert!(p.x > 0.0);
//! # Ok::<(), probe::HwError>(())
//! ```

pub mod bounds;
pub mod distance;
pub mod error;
pub mod hardware;
pub mod shared;
pub mod sim;
pub mod types;

pub use bounds::{BoundsError, SpaceBounds, CURRENT_LIMIT, OBSERVATION_LIMIT};
pub use distance::distance;
pub use error::HwError;
pub use hardware::Probe;
pub use shared::SharedProbe;
pub use sim::{default_gain, GainMatrix, SimulatedProbe};
pub use types::{ControlVector, Position, COIL_COUNT};
