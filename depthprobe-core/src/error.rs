//! Error types for depthprobe

use thiserror::Error;

/// Main error type for depthprobe operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No {0} bound: bind one before sampling")]
    NotBound(&'static str),

    #[error("Index out of bounds: {0}")]
    OutOfBounds(String),
}

/// Result type alias for depthprobe operations
pub type Result<T> = std::result::Result<T, Error>;
