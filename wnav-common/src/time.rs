//! Timestamp utilities
//!
//! The tracking engine measures every interval (debounce windows, ETA
//! throttling) in integer milliseconds since the Unix epoch.

use chrono::{DateTime, TimeZone, Utc};

/// Convert epoch milliseconds to a UTC timestamp
///
/// Out-of-range values clamp to the Unix epoch.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::from(std::time::UNIX_EPOCH))
}
