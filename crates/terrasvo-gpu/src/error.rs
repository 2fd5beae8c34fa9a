//! GPU error types.

use std::time::Duration;

use thiserror::Error;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Octree or buffer error.
    #[error(transparent)]
    Octree(#[from] terrasvo_core::Error),

    /// In-flight device work did not drain in time.
    #[error("Device did not go idle within {0:?}")]
    FenceTimeout(Duration),

    /// Invalid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
