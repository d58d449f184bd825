//! Error types for the stabilization engine.

use selfstab_topology::TopologyError;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur before or around a stabilization run.
///
/// All of these are input-validation failures. Once a system is built from
/// valid input the rules themselves cannot fail; they can only fail to
/// terminate, which the step bound handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Requested system size below one node
    #[error("invalid system size {requested}: a system needs at least one node")]
    InvalidSize { requested: i64 },

    /// Requested fault count below zero
    #[error("invalid fault count {requested}: fault count cannot be negative")]
    InvalidFaultCount { requested: i64 },

    /// Selected index past the last node
    #[error("index {index} out of range for system of {len} nodes")]
    IndexOutOfRange { index: usize, len: usize },

    /// Primary value outside {0, 1}
    #[error("invalid primary value {0}: expected 0 or 1")]
    InvalidPrimary(u8),

    /// Fault injection requested after the convergence run
    #[error("faults can only be injected before the system is stabilized")]
    FaultAfterRun,

    /// Malformed configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<TopologyError> for Error {
    fn from(e: TopologyError) -> Self {
        match e {
            TopologyError::Empty => Error::InvalidSize { requested: 0 },
            TopologyError::IndexOutOfRange { index, len } => Error::IndexOutOfRange { index, len },
        }
    }
}
