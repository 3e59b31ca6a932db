//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch, as used in export filenames
pub fn unix_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}
