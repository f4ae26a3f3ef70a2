//! # Simulated Probe
//!
//! A software stand-in for the magnetic rig. The plant is quasi-static: once
//! the coils have settled, the probe sits at
//!
//! ```text
//! position = rest + G · currents
//! ```
//!
//! where `G` is a 3×9 gain matrix. Readings are clamped to the observation
//! bounds and snapped to a grid of `resolution` units, so a goal placed on the
//! same grid can be reached exactly.

use tracing::debug;

use crate::bounds::SpaceBounds;
use crate::error::HwError;
use crate::hardware::Probe;
use crate::types::{ControlVector, Position, COIL_COUNT};

/// Gain from coil current (A) to probe displacement (grid units).
pub type GainMatrix = [[f64; COIL_COUNT]; 3];

/// Largest per-axis offset of a freshly placed goal.
pub const DEFAULT_GOAL_DEVIATION: f64 = 5.0;
/// Grid pitch of the sensed coordinates.
pub const DEFAULT_RESOLUTION: f64 = 1.0;

/// Pull of the inner, middle and outer coil triplet.
const RING_GAIN: [f64; 3] = [1.0, 0.5, 0.25];

/// Coils are wound in three triplets. Coil `k` pushes along axis `k % 3`;
/// the inner triplet is strongest and each outer one has half the pull.
#[must_use]
pub fn default_gain() -> GainMatrix {
    let mut gain = [[0.0; COIL_COUNT]; 3];
    for coil in 0..COIL_COUNT {
        gain[coil % 3][coil] = RING_GAIN[coil / 3];
    }
    gain
}

#[derive(Clone, Debug)]
pub struct SimulatedProbe {
    rest: Position,
    gain: GainMatrix,
    currents: ControlVector,
    goal: Option<Position>,
    observation_bounds: SpaceBounds,
    action_bounds: SpaceBounds,
    resolution: f64,
    goal_deviation: f64,
    fail_reads: u32,
    fail_actuations: u32,
    actuations: u64,
}

impl Default for SimulatedProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProbe {
    /// Probe at rest at the origin with the default coil layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rest: Position::ZERO,
            gain: default_gain(),
            currents: ControlVector::ZERO,
            goal: None,
            observation_bounds: SpaceBounds::observation(),
            action_bounds: SpaceBounds::action(),
            resolution: DEFAULT_RESOLUTION,
            goal_deviation: DEFAULT_GOAL_DEVIATION,
            fail_reads: 0,
            fail_actuations: 0,
            actuations: 0,
        }
    }

    #[must_use]
    pub fn with_rest(mut self, rest: Position) -> Self {
        self.rest = rest;
        self
    }

    #[must_use]
    pub fn with_gain(mut self, gain: GainMatrix) -> Self {
        self.gain = gain;
        self
    }

    /// Grid pitch; `0.0` disables snapping.
    #[must_use]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution.max(0.0);
        self
    }

    #[must_use]
    pub fn with_goal_deviation(mut self, deviation: f64) -> Self {
        self.goal_deviation = deviation.abs();
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, observation: SpaceBounds, action: SpaceBounds) -> Self {
        self.observation_bounds = observation;
        self.action_bounds = action;
        self
    }

    /// Makes the next `n` sensor reads fail.
    pub fn fail_next_reads(&mut self, n: u32) {
        self.fail_reads = n;
    }

    /// Makes the next `n` actuation commands fail.
    pub fn fail_next_actuations(&mut self, n: u32) {
        self.fail_actuations = n;
    }

    /// Overrides the goal, e.g. to pin it to the current position.
    pub fn set_goal(&mut self, goal: Position) {
        self.goal = Some(goal);
    }

    #[must_use]
    pub fn currents(&self) -> &ControlVector {
        &self.currents
    }

    /// Number of accepted actuation commands.
    #[must_use]
    pub fn actuation_count(&self) -> u64 {
        self.actuations
    }

    /// Settled position for the currently applied currents, without fault
    /// injection.
    #[must_use]
    pub fn settled_position(&self) -> Position {
        let mut p = self.rest.to_array();
        for (axis, row) in self.gain.iter().enumerate() {
            p[axis] += row
                .iter()
                .zip(self.currents.as_slice())
                .map(|(g, i)| g * i)
                .sum::<f64>();
        }
        self.snap(Position::from(p))
    }

    /// Currents that move the probe toward `target`.
    ///
    /// Starts from the minimum-norm solution `Gᵀ (G Gᵀ)⁻¹ (target - rest)`.
    /// Coils that would exceed the action bounds are pinned at their limit and
    /// the remaining coils are re-solved for what is left. Returns `None` when
    /// the gain matrix cannot steer all three axes; an unreachable target gets
    /// the closest saturated command.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn command_for(&self, target: Position) -> Option<ControlVector> {
        let d = [
            target.x - self.rest.x,
            target.y - self.rest.y,
            target.z - self.rest.z,
        ];
        let mut currents = [0.0; COIL_COUNT];
        let mut pinned = [false; COIL_COUNT];

        for round in 0..=COIL_COUNT {
            let mut gain = self.gain;
            let mut residual = d;
            for coil in (0..COIL_COUNT).filter(|&c| pinned[c]) {
                for axis in 0..3 {
                    residual[axis] -= gain[axis][coil] * currents[coil];
                    gain[axis][coil] = 0.0;
                }
            }
            let Some(inv) = invert3(&gram(&gain)) else {
                return (round > 0).then_some(ControlVector(currents));
            };
            let mut w = [0.0; 3];
            for (r, row) in inv.iter().enumerate() {
                w[r] = row.iter().zip(&residual).map(|(a, b)| a * b).sum();
            }

            let mut saturated = false;
            for coil in 0..COIL_COUNT {
                if pinned[coil] {
                    continue;
                }
                let raw: f64 = (0..3).map(|axis| gain[axis][coil] * w[axis]).sum();
                let clamped = self.action_bounds.clamp_axis(coil, raw);
                currents[coil] = clamped;
                if clamped != raw {
                    pinned[coil] = true;
                    saturated = true;
                }
            }
            if !saturated {
                break;
            }
        }
        Some(ControlVector(currents))
    }

    /// Region goals are placed in: the part of the observation box the coils
    /// can actually reach, shrunk onto the grid.
    #[must_use]
    pub fn goal_bounds(&self) -> SpaceBounds {
        let rest = self.rest.to_array();
        let mut low = vec![0.0; 3];
        let mut high = vec![0.0; 3];
        for axis in 0..3 {
            let (mut lo, mut hi) = (rest[axis], rest[axis]);
            for coil in 0..COIL_COUNT {
                let g = self.gain[axis][coil];
                let a = g * self.action_bounds.per_axis_low.get(coil).copied().unwrap_or(0.0);
                let b = g * self.action_bounds.per_axis_high.get(coil).copied().unwrap_or(0.0);
                lo += a.min(b);
                hi += a.max(b);
            }
            lo = self.observation_bounds.clamp_axis(axis, lo);
            hi = self.observation_bounds.clamp_axis(axis, hi);
            if self.resolution > 0.0 {
                lo = (lo / self.resolution).ceil() * self.resolution;
                hi = (hi / self.resolution).floor() * self.resolution;
            }
            if lo > hi {
                lo = rest[axis];
                hi = rest[axis];
            }
            low[axis] = lo;
            high[axis] = hi;
        }
        SpaceBounds { per_axis_low: low, per_axis_high: high }
    }

    fn snap(&self, p: Position) -> Position {
        let snapped = if self.resolution > 0.0 {
            let r = self.resolution;
            Position::new(
                (p.x / r).round() * r,
                (p.y / r).round() * r,
                (p.z / r).round() * r,
            )
        } else {
            p
        };
        self.observation_bounds.clamp_position(snapped)
    }
}

impl Probe for SimulatedProbe {
    fn set_actuation(&mut self, currents: &ControlVector) -> Result<(), HwError> {
        if self.fail_actuations > 0 {
            self.fail_actuations -= 1;
            return Err(HwError::Actuator("injected fault".to_string()));
        }
        if let Some(channel) = currents.first_non_finite() {
            return Err(HwError::Rejected { channel, value: currents.0[channel] });
        }
        // The supply saturates rather than refusing out-of-range commands.
        let mut applied = *currents;
        for (coil, c) in applied.0.iter_mut().enumerate() {
            *c = self.action_bounds.clamp_axis(coil, *c);
        }
        self.currents = applied;
        self.actuations += 1;
        debug!(currents = ?applied.0, "simulated coils driven");
        Ok(())
    }

    fn read_position(&mut self) -> Result<Position, HwError> {
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(HwError::Sensor("injected fault".to_string()));
        }
        Ok(self.settled_position())
    }

    fn place_goal_relative(&mut self, rng: &mut fastrand::Rng) -> Result<Position, HwError> {
        let reference = self.settled_position();
        let dev = self.goal_deviation;
        let offset = || (rng.f64() * 2.0 - 1.0) * dev;
        let goal = self
            .goal_bounds()
            .clamp_position(self.snap(reference.offset(offset(), offset(), offset())));
        debug!(%reference, %goal, "goal placed");
        self.goal = Some(goal);
        Ok(goal)
    }

    fn goal(&self) -> Option<Position> {
        self.goal
    }
}

fn gram(g: &GainMatrix) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (r, out_row) in out.iter_mut().enumerate() {
        for (c, cell) in out_row.iter_mut().enumerate() {
            *cell = g[r].iter().zip(&g[c]).map(|(a, b)| a * b).sum();
        }
    }
    out
}

fn invert3(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    if det.abs() < 1e-12 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}
