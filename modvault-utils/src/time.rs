//! Wall-clock helpers.

use chrono::Utc;

/// Milliseconds since the unix epoch, as stored in persisted timestamps.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
