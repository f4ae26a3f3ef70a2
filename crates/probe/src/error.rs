use thiserror::Error;

/// Failures reported by a probe driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HwError {
    #[error("control vector has {actual} channels, rig expects {expected}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("coil {channel} rejected command {value}")]
    Rejected { channel: usize, value: f64 },
    #[error("sensor read failed: {0}")]
    Sensor(String),
    #[error("actuator write failed: {0}")]
    Actuator(String),
    #[error("no goal has been placed")]
    NoGoal,
    #[error("probe link disconnected")]
    Disconnected,
}
