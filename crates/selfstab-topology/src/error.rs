//! Error types for topology construction and lookup.

use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors raised while building or querying a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A topology needs at least one position.
    #[error("topology must have at least one position")]
    Empty,

    /// Lookup past the last position.
    #[error("index {index} out of range for topology of {len} positions")]
    IndexOutOfRange { index: usize, len: usize },
}
