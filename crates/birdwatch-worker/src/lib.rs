//! # birdwatch-worker
//!
//! The polling worker loop that drives the queue to completion, and the
//! reference Wikipedia-backed [`Processor`](birdwatch_core::Processor)
//! implementation.

mod pool;
mod wikipedia;
mod worker;

pub use pool::WorkerPool;
pub use wikipedia::WikipediaProcessor;
pub use worker::Worker;

#[cfg(test)]
mod tests {
    use super::*;
    use birdwatch_core::{async_trait, Config, Job};
    use birdwatch_observer::Observer;
    use birdwatch_queue::Queue;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_config() -> Config {
        Config {
            port: 0,
            queue_db_path: String::new(),
            observer_db_path: String::new(),
            poll_interval_ms: 10,
            base_delay_ms: 1,
            max_retries: 2,
            default_metrics_window_ms: 3 * 60 * 60 * 1000,
            failure_rate_threshold: 0.5,
            timestamp_pad_length: 13,
            worker_concurrency: 1,
        }
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl birdwatch_core::Processor for AlwaysSucceeds {
        async fn process(&self, _job: &Job) -> anyhow::Result<Value> {
            Ok(json!({"research": "ok"}))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl birdwatch_core::Processor for AlwaysFails {
        async fn process(&self, _job: &Job) -> anyhow::Result<Value> {
            anyhow::bail!("processor unavailable")
        }
    }

    struct CountingProcessor {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl birdwatch_core::Processor for CountingProcessor {
        async fn process(&self, _job: &Job) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("still unavailable")
        }
    }

    fn open_fixtures() -> (tempfile::TempDir, tempfile::TempDir, Queue, Observer) {
        let queue_dir = tempfile::tempdir().unwrap();
        let observer_dir = tempfile::tempdir().unwrap();
        let queue = Queue::open(queue_dir.path(), 13).unwrap();
        let observer = Observer::open(observer_dir.path(), 13, 3 * 60 * 60 * 1000, 0.5).unwrap();
        (queue_dir, observer_dir, queue, observer)
    }

    #[tokio::test]
    async fn tick_with_no_jobs_does_nothing() {
        let (_qd, _od, queue, observer) = open_fixtures();
        let worker = Worker::new(queue, observer, Arc::new(AlwaysSucceeds), &test_config());
        assert!(!worker.tick().await.unwrap());
    }

    #[tokio::test]
    async fn tick_completes_a_successful_job() {
        let (_qd, _od, queue, observer) = open_fixtures();
        queue.submit("Kea").await.unwrap();
        let worker = Worker::new(queue.clone(), observer.clone(), Arc::new(AlwaysSucceeds), &test_config());

        assert!(worker.tick().await.unwrap());

        let job = queue.get("kea").await.unwrap().unwrap();
        assert_eq!(job.status, birdwatch_core::JobStatus::Completed);
        assert_eq!(job.body["research"], "ok");

        let trace = observer.trace("kea").await.unwrap();
        let actions: Vec<_> = trace.iter().map(|e| e.action).collect();
        assert!(actions.contains(&birdwatch_core::ActionKind::JobClaimed));
        assert!(actions.contains(&birdwatch_core::ActionKind::JobCompleted));
    }

    #[tokio::test]
    async fn tick_retries_a_failed_job_until_max_retries_then_fails() {
        let (_qd, _od, queue, observer) = open_fixtures();
        queue.submit("Osprey").await.unwrap();
        let config = test_config(); // max_retries = 2
        let worker = Worker::new(queue.clone(), observer.clone(), Arc::new(AlwaysFails), &config);

        // Attempt 1: retryCount 0 -> 1, still queued (future availableAt).
        assert!(worker.tick().await.unwrap());
        let job = queue.get("osprey").await.unwrap().unwrap();
        assert_eq!(job.status, birdwatch_core::JobStatus::Queued);
        assert_eq!(job.retry_count, 1);

        // Force eligibility so the test doesn't need to wait for the real backoff.
        queue.retry("osprey", 0).await.unwrap();
        let job = queue.get("osprey").await.unwrap().unwrap();
        assert_eq!(job.retry_count, 2);

        // Attempt at retryCount == max_retries (2): permanently fails.
        assert!(worker.tick().await.unwrap());
        let job = queue.get("osprey").await.unwrap().unwrap();
        assert_eq!(job.status, birdwatch_core::JobStatus::Failed);

        let trace = observer.trace("osprey").await.unwrap();
        assert!(trace
            .iter()
            .any(|e| e.action == birdwatch_core::ActionKind::JobFailed));
    }

    #[tokio::test]
    async fn pool_runs_workers_until_shutdown() {
        let (_qd, _od, queue, observer) = open_fixtures();
        queue.submit("Kea").await.unwrap();
        queue.submit("Tui").await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let processor = Arc::new(CountingProcessor { calls: calls.clone() });
        let pool = WorkerPool::spawn(2, queue.clone(), observer, processor, &test_config());

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        pool.shutdown().await;

        assert!(calls.load(Ordering::SeqCst) >= 2);
    }
}
