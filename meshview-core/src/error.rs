//! Error types for meshview

use thiserror::Error;

/// Main error type for meshview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for meshview operations
pub type Result<T> = std::result::Result<T, Error>;
