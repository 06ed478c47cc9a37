//! # birdwatch-observer
//!
//! The append-only event log: per-job tracing, metrics derived on read over
//! a trailing window, and passive alerting on elevated failure rate.
//!
//! Events are immutable once written and keyed `pad(timestamp, W) || "-" ||
//! uuid` in a single `events` table, the same scheme `birdwatch-queue` uses
//! for its availability index — a windowed scan is just a prefix scan
//! starting at the window's lower bound.

mod alert;
mod error;
mod key;

use std::path::Path;
use std::sync::Arc;

use birdwatch_core::{now_ms, ActionKind, Event, Severity};
use birdwatch_storage::Store;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

pub use alert::{AlertSink, StdoutAlertSink};
pub use error::ObserverError;

pub const EVENTS_CF: &str = "events";

/// Metrics computed over a trailing window of the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub failure_rate: f64,
    pub avg_processing_time_ms: Option<f64>,
}

/// The event log.
#[derive(Clone)]
pub struct Observer {
    store: Store,
    pad_width: usize,
    alert_sink: Arc<dyn AlertSink>,
    default_metrics_window_ms: i64,
    failure_rate_threshold: f64,
}

impl Observer {
    pub fn open(
        path: impl AsRef<Path>,
        pad_width: usize,
        default_metrics_window_ms: i64,
        failure_rate_threshold: f64,
    ) -> Result<Self, ObserverError> {
        Self::open_with_sink(
            path,
            pad_width,
            default_metrics_window_ms,
            failure_rate_threshold,
            Arc::new(StdoutAlertSink),
        )
    }

    /// Open with an explicit alert sink, for tests and for callers that want
    /// alerts routed somewhere other than standard output.
    pub fn open_with_sink(
        path: impl AsRef<Path>,
        pad_width: usize,
        default_metrics_window_ms: i64,
        failure_rate_threshold: f64,
        alert_sink: Arc<dyn AlertSink>,
    ) -> Result<Self, ObserverError> {
        let store = Store::open(path, &[EVENTS_CF])?;
        Ok(Self {
            store,
            pad_width,
            alert_sink,
            default_metrics_window_ms,
            failure_rate_threshold,
        })
    }

    /// Append one event to the log. If `action` is `job-failed`, recomputes
    /// metrics over the default window and emits an alert through the sink
    /// if the failure rate exceeds the configured threshold.
    pub async fn log(
        &self,
        action: ActionKind,
        severity: Severity,
        body: Value,
    ) -> Result<Event, ObserverError> {
        let event = Event::new(Uuid::new_v4(), now_ms(), severity, action, body);
        let key = key::event_key(event.timestamp, &event.id.to_string(), self.pad_width);
        let value = serde_json::to_vec(&event)?;
        self.store.put(EVENTS_CF, key, value).await?;

        if event.action == ActionKind::JobFailed {
            let metrics = self.metrics(self.default_metrics_window_ms).await?;
            if metrics.failure_rate > self.failure_rate_threshold {
                let total = metrics.completed + metrics.failed;
                let message = format!(
                    "ALERT: High failure rate detected: {:.1}% ({}/{} jobs failed)",
                    metrics.failure_rate * 100.0,
                    metrics.failed,
                    total
                );
                warn!(failure_rate = metrics.failure_rate, failed = metrics.failed, total, "{}", message);
                self.alert_sink.alert(&message);
            }
        }

        Ok(event)
    }

    /// All events with `body.jobId == job_id`, in ascending timestamp order.
    /// A full, unbounded scan: acceptable under the single-host, moderate
    /// volume assumption this store was built for.
    pub async fn trace(&self, job_id: &str) -> Result<Vec<Event>, ObserverError> {
        let rows = self.store.scan_from(EVENTS_CF, Vec::new(), None).await?;
        let mut events = Vec::new();
        for (_, value) in rows {
            let event: Event = serde_json::from_slice(&value)?;
            if event.body.get("jobId").and_then(Value::as_str) == Some(job_id) {
                events.push(event);
            }
        }
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    /// Metrics over the trailing `window_ms`, computed by scanning events
    /// from `now - window_ms` onward.
    pub async fn metrics(&self, window_ms: i64) -> Result<Metrics, ObserverError> {
        let start = key::window_start(now_ms() - window_ms, self.pad_width);
        let rows = self.store.scan_from(EVENTS_CF, start, None).await?;

        let mut submitted = 0u64;
        let mut completed = 0u64;
        let mut failed = 0u64;
        let mut claimed_at: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
        let mut processing_durations: Vec<f64> = Vec::new();

        for (_, value) in rows {
            let event: Event = serde_json::from_slice(&value)?;
            let job_id = event
                .body
                .get("jobId")
                .and_then(Value::as_str)
                .map(str::to_string);

            match event.action {
                ActionKind::JobSubmitted => submitted += 1,
                ActionKind::JobCompleted => {
                    completed += 1;
                    if let Some(job_id) = &job_id {
                        if let Some(claimed) = claimed_at.remove(job_id) {
                            processing_durations.push((event.timestamp - claimed) as f64);
                        }
                    }
                }
                ActionKind::JobFailed => failed += 1,
                ActionKind::JobClaimed => {
                    if let Some(job_id) = job_id {
                        claimed_at.insert(job_id, event.timestamp);
                    }
                }
                _ => {}
            }
        }

        let denominator = completed + failed;
        let failure_rate = if denominator == 0 {
            0.0
        } else {
            failed as f64 / denominator as f64
        };

        let avg_processing_time_ms = if processing_durations.is_empty() {
            None
        } else {
            Some(processing_durations.iter().sum::<f64>() / processing_durations.len() as f64)
        };

        Ok(Metrics {
            submitted,
            completed,
            failed,
            failure_rate,
            avg_processing_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    impl AlertSink for RecordingSink {
        fn alert(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn open_observer() -> (tempfile::TempDir, Observer, Arc<RecordingSink>) {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink {
            messages: Mutex::new(Vec::new()),
        });
        let observer = Observer::open_with_sink(dir.path(), 13, 3 * 60 * 60 * 1000, 0.5, sink.clone())
            .unwrap();
        (dir, observer, sink)
    }

    #[tokio::test]
    async fn trace_returns_only_matching_job_in_order() {
        let (_dir, observer, _sink) = open_observer();
        observer
            .log(ActionKind::JobSubmitted, Severity::Log, json!({"jobId": "kea"}))
            .await
            .unwrap();
        observer
            .log(ActionKind::JobSubmitted, Severity::Log, json!({"jobId": "other"}))
            .await
            .unwrap();
        observer
            .log(ActionKind::JobClaimed, Severity::Log, json!({"jobId": "kea"}))
            .await
            .unwrap();
        observer
            .log(ActionKind::JobCompleted, Severity::Log, json!({"jobId": "kea"}))
            .await
            .unwrap();

        let trace = observer.trace("kea").await.unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0].action, ActionKind::JobSubmitted);
        assert_eq!(trace[1].action, ActionKind::JobClaimed);
        assert_eq!(trace[2].action, ActionKind::JobCompleted);
        assert!(trace.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn metrics_excludes_submitted_from_failure_rate_denominator() {
        let (_dir, observer, _sink) = open_observer();
        observer
            .log(ActionKind::JobSubmitted, Severity::Log, json!({"jobId": "a"}))
            .await
            .unwrap();
        observer
            .log(ActionKind::JobCompleted, Severity::Log, json!({"jobId": "a"}))
            .await
            .unwrap();
        observer
            .log(ActionKind::JobFailed, Severity::Error, json!({"jobId": "b"}))
            .await
            .unwrap();

        let metrics = observer.metrics(60_000).await.unwrap();
        assert_eq!(metrics.submitted, 1);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.failure_rate, 0.5);
    }

    #[tokio::test]
    async fn metrics_pairs_claim_and_complete_for_average_processing_time() {
        let (_dir, observer, _sink) = open_observer();
        observer
            .log(ActionKind::JobClaimed, Severity::Log, json!({"jobId": "a"}))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        observer
            .log(ActionKind::JobCompleted, Severity::Log, json!({"jobId": "a"}))
            .await
            .unwrap();

        let metrics = observer.metrics(60_000).await.unwrap();
        let avg = metrics.avg_processing_time_ms.expect("a claim/complete pair");
        assert!(avg >= 0.0);
    }

    #[tokio::test]
    async fn metrics_with_no_events_has_zero_failure_rate_and_no_average() {
        let (_dir, observer, _sink) = open_observer();
        let metrics = observer.metrics(60_000).await.unwrap();
        assert_eq!(metrics.failure_rate, 0.0);
        assert_eq!(metrics.avg_processing_time_ms, None);
    }

    #[tokio::test]
    async fn alerts_on_elevated_failure_rate() {
        let (_dir, observer, sink) = open_observer();
        observer
            .log(ActionKind::JobCompleted, Severity::Log, json!({"jobId": "a"}))
            .await
            .unwrap();
        observer
            .log(ActionKind::JobFailed, Severity::Error, json!({"jobId": "b"}))
            .await
            .unwrap();
        assert!(sink.messages.lock().unwrap().is_empty());

        observer
            .log(ActionKind::JobFailed, Severity::Error, json!({"jobId": "c"}))
            .await
            .unwrap();

        let messages = sink.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("High failure rate detected: 66.7% (2/3 jobs failed)"));
    }
}
