//! Common error types for the LXP host

use thiserror::Error;

/// Common result type for LXP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the host service and its tools
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (course id, form field, payload shape)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Course archive could not be read or unpacked
    #[error("Archive error: {0}")]
    Archive(String),

    /// Outbound HTTP call failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
