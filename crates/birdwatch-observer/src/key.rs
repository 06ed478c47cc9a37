//! Encoding for the events table: `pad(timestamp, W) || "-" || uuid`, the
//! same scheme `birdwatch-queue` uses for its availability index, so a
//! prefix scan starting at `pad(now - windowMs, W)` returns exactly the
//! events at or after that instant.

pub fn event_key(timestamp: i64, id: &str, width: usize) -> Vec<u8> {
    format!("{timestamp:0width$}-{id}").into_bytes()
}

/// Lower bound for a windowed scan: the key of a hypothetical event at
/// exactly `timestamp` with the lowest-sorting id, so the scan's first
/// match is the first real event at or after `timestamp`.
pub fn window_start(timestamp: i64, width: usize) -> Vec<u8> {
    format!("{timestamp:0width$}-").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_start_sorts_before_same_timestamp_events() {
        let start = window_start(1_000, 13);
        let event = event_key(1_000, "00000000-0000-0000-0000-000000000000", 13);
        assert!(start < event);
    }
}
