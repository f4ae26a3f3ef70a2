//! # Distance Evaluator
//!
//! Euclidean distance between two probe coordinates. This is the only metric
//! the controller scores against, and simulated goal placement uses it as well.

use crate::types::Position;

/// Euclidean distance between `a` and `b`.
///
/// Non-negative, symmetric and zero exactly when the points coincide. NaN or
/// infinite inputs propagate into the result instead of panicking.
#[must_use]
pub fn distance(a: Position, b: Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

impl Position {
    /// Distance from `self` to `other`, see [`distance`].
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        distance(self, other)
    }
}
