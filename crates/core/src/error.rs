//! Error types shared across the frame pacer.

use thiserror::Error;

/// Top-level error type for the frame pacer.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (bad CLI flag, out-of-range value)
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using the frame pacer's Error type.
pub type Result<T> = std::result::Result<T, Error>;
