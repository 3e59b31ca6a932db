//! Common error types for Polyecho

use thiserror::Error;

/// Common result type for Polyecho operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Polyecho crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or document field
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
