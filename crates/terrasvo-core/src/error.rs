//! Error types for the octree crates.

use thiserror::Error;

/// Octree-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration rejected before any work was done
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The node arena would grow past its budget
    #[error("Node capacity exceeded: {requested} nodes requested, limit is {limit}")]
    CapacityExceeded { requested: usize, limit: usize },

    /// A buffer cannot hold the serialized tree
    #[error("Buffer too small: {required} bytes required, {available} available")]
    BufferTooSmall { required: usize, available: usize },

    /// Invalid data error
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
