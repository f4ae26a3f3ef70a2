use probe::{BoundsError, HwError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error("step called before the first reset")]
    NotReset,
    #[error("probe failure after {attempts} attempt(s): {source}")]
    Hardware {
        attempts: u32,
        #[source]
        source: HwError,
    },
    #[error("settle wait cancelled after actuation; read-back skipped")]
    Cancelled,
    #[error("invalid bounds: {0}")]
    Bounds(#[from] BoundsError),
}
