//! Encoding for the queue's availability-ordered secondary index.
//!
//! The index key is `pad(availableAt, W) || "-" || id`. As long as every
//! timestamp in the system's lifetime zero-pads to the same width `W`,
//! lexicographic order over this encoding is identical to numeric
//! `(availableAt, id)` order, so the first key in the index is always the
//! next eligible job.

pub fn index_key(available_at: i64, id: &str, width: usize) -> Vec<u8> {
    format!("{available_at:0width$}-{id}").into_bytes()
}

/// Parse the `availableAt` timestamp back out of an index key's fixed-width
/// prefix.
pub fn parse_available_at(key: &[u8], width: usize) -> Option<i64> {
    let key = std::str::from_utf8(key).ok()?;
    key.get(..width)?.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_timestamp_then_id() {
        let a = index_key(1_000, "alpha", 13);
        let b = index_key(1_000, "beta", 13);
        let c = index_key(2_000, "aardvark", 13);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn round_trips_timestamp() {
        let key = index_key(1_700_000_000_123, "kea", 13);
        assert_eq!(parse_available_at(&key, 13), Some(1_700_000_000_123));
    }
}
