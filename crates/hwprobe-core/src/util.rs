//! Wall-clock helpers.

use chrono::Utc;

/// Current time in whole seconds since the Unix epoch (never negative).
pub fn now_epoch_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}
