//! Small shared helpers that don't warrant their own module.

use chrono::{DateTime, Utc};

/// Format epoch milliseconds as an ISO-8601 UTC timestamp.
pub fn iso8601_utc(ts_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts_ms)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default())
        .to_rfc3339()
}
