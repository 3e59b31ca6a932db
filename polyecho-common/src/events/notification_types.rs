//! User-facing notification banners

use serde::{Deserialize, Serialize};

/// Default lifetime of progress banners
pub const PROGRESS_NOTIFICATION_MS: u64 = 10_000;

/// Banner severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A (message, severity, duration) triple for the notification sink
///
/// `duration_ms` of `None` means the banner stays until dismissed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration_ms: Option<u64>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity, duration_ms: Option<u64>) -> Self {
        Self {
            message: message.into(),
            severity,
            duration_ms,
        }
    }

    /// Progress banner that dismisses itself after ten seconds
    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info, Some(PROGRESS_NOTIFICATION_MS))
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success, None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error, None)
    }
}
