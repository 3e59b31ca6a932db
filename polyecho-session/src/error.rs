//! Error types for polyecho-session
//!
//! Each lower layer returns a typed variant; the download orchestration
//! logs the detail and surfaces one generic failure to the user.

use std::time::Duration;
use thiserror::Error;

/// Main error type for polyecho-session
#[derive(Error, Debug)]
pub enum Error {
    /// A stem's audio could not be retrieved
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Archive serialization errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Save target errors
    #[error("Save error: {0}")]
    Save(String),

    /// Not every stem arrived before the deadline
    #[error(
        "Timed out after {waited:?} waiting for stems ({collected}/{expected} collected, missing: [{}])",
        .missing.join(", ")
    )]
    CollectTimeout {
        expected: usize,
        collected: usize,
        missing: Vec<String>,
        waited: Duration,
    },

    /// More payloads were collected than the project declares
    #[error("Collected {collected} stems but expected {expected}")]
    CountMismatch { expected: usize, collected: usize },

    /// The wait was cancelled before completion
    #[error("Stem collection cancelled")]
    Cancelled,

    /// A second payload arrived under an existing stem name
    #[error("Duplicate stem payload: {0}")]
    DuplicateStem(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// polyecho-common error
    #[error("Common error: {0}")]
    Common(#[from] polyecho_common::Error),
}

/// Convenience Result type using polyecho-session Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_lists_missing_stems() {
        let err = Error::CollectTimeout {
            expected: 3,
            collected: 1,
            missing: vec!["bass".to_string(), "lead".to_string()],
            waited: Duration::from_secs(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("1/3"));
        assert!(msg.contains("missing: [bass, lead]"));
    }

    #[test]
    fn test_common_error_converts() {
        let err: Error = polyecho_common::Error::InvalidInput("bpm".to_string()).into();
        assert!(matches!(err, Error::Common(_)));
    }
}
