/// Destination for alert messages emitted by [`crate::Observer::log`]. The
/// default sink writes to standard output; tests substitute an in-memory
/// sink to assert on alert content without capturing process stdout.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Writes alerts to standard output, prefixed the way the rest of the
/// system's ad-hoc operational logging is.
pub struct StdoutAlertSink;

impl AlertSink for StdoutAlertSink {
    fn alert(&self, message: &str) {
        println!("{message}");
    }
}
