//! # Distance-Delta Reward
//!
//! Scores one step from the distance before and after it. Proximity bands are
//! checked before the improvement comparison, so a step that lands inside a
//! band is scored by the band even if it also got closer.

/// Reward for landing exactly on the goal. The only terminal reward.
pub const REWARD_GOAL: i32 = 4;
/// Reward for ending inside [`NEAR_RADIUS`].
pub const REWARD_NEAR: i32 = 3;
/// Reward for ending inside [`CLOSE_RADIUS`].
pub const REWARD_CLOSE: i32 = 2;
pub const REWARD_IMPROVED: i32 = 1;
pub const REWARD_UNCHANGED: i32 = 0;
pub const REWARD_WORSENED: i32 = -1;

pub const NEAR_RADIUS: f64 = 1.0;
pub const CLOSE_RADIUS: f64 = 5.0;

/// Reward for moving from `previous` to `current` distance.
///
/// NaN never equals zero and never orders, so a NaN `current` scores
/// [`REWARD_UNCHANGED`].
#[must_use]
#[allow(clippy::float_cmp)]
pub fn reward(previous: f64, current: f64) -> i32 {
    if current == 0.0 {
        REWARD_GOAL
    } else if current < NEAR_RADIUS {
        REWARD_NEAR
    } else if current < CLOSE_RADIUS {
        REWARD_CLOSE
    } else if previous > current {
        REWARD_IMPROVED
    } else if previous < current {
        REWARD_WORSENED
    } else {
        REWARD_UNCHANGED
    }
}

/// An episode ends only when the goal is hit exactly.
#[must_use]
pub const fn is_terminal(reward: i32) -> bool {
    reward == REWARD_GOAL
}
