//! Wall-clock milliseconds, the unit every timestamp in this system is kept in.

use chrono::Utc;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
