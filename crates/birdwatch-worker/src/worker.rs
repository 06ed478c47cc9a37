use std::sync::Arc;

use birdwatch_core::{now_ms, ActionKind, Config, Job, Processor, Severity};
use birdwatch_observer::Observer;
use birdwatch_queue::Queue;
use serde_json::json;
use tracing::{error, info, warn};

/// One polling worker: claims a job, runs it through the processor, and
/// records the outcome, forever, until told to stop.
pub struct Worker {
    id: String,
    queue: Queue,
    observer: Observer,
    processor: Arc<dyn Processor>,
    poll_interval_ms: u64,
    base_delay_ms: u64,
    max_retries: u32,
}

/// Generates a worker id of the form `w-` plus four lowercase hex digits.
fn generate_worker_id() -> String {
    format!("w-{:04x}", fastrand::u16(..))
}

impl Worker {
    pub fn new(
        queue: Queue,
        observer: Observer,
        processor: Arc<dyn Processor>,
        config: &Config,
    ) -> Self {
        Self {
            id: generate_worker_id(),
            queue,
            observer,
            processor,
            poll_interval_ms: config.poll_interval_ms,
            base_delay_ms: config.base_delay_ms,
            max_retries: config.max_retries,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the polling cycle until `shutdown` fires. Each tick claims at
    /// most one job; an idle tick sleeps for `poll_interval_ms` before
    /// trying again.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        self.observer
            .log(
                ActionKind::WorkerStart,
                Severity::Log,
                json!({"workerId": self.id}),
            )
            .await
            .ok();
        info!(worker_id = %self.id, "worker starting");

        loop {
            if *shutdown.borrow() {
                return;
            }

            if let Err(e) = self.tick().await {
                error!(worker_id = %self.id, error = %e, "tick failed, continuing on next interval");
            }

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_millis(self.poll_interval_ms)) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// Run a single tick: claim one job (if any) and drive it to
    /// completion, retry, or permanent failure. Returns whether a job was
    /// claimed, for tests that want to drive ticks deterministically.
    pub async fn tick(&self) -> anyhow::Result<bool> {
        let Some(job) = self.queue.claim().await? else {
            return Ok(false);
        };

        self.observer
            .log(
                ActionKind::JobClaimed,
                Severity::Log,
                json!({"jobId": job.id}),
            )
            .await?;

        match self.processor.process(&job).await {
            Ok(result) => {
                self.queue.complete(&job.id, result).await?;
                self.observer
                    .log(
                        ActionKind::JobCompleted,
                        Severity::Log,
                        json!({"jobId": job.id}),
                    )
                    .await?;
            }
            Err(e) => self.handle_failure(&job, &e).await?,
        }

        Ok(true)
    }

    async fn handle_failure(&self, job: &Job, error: &anyhow::Error) -> anyhow::Result<()> {
        if job.retry_count >= self.max_retries {
            self.queue.fail(&job.id).await?;
            self.observer
                .log(
                    ActionKind::JobFailed,
                    Severity::Error,
                    json!({"jobId": job.id, "error": error.to_string()}),
                )
                .await?;
            warn!(worker_id = %self.id, job_id = %job.id, "job permanently failed");
        } else {
            let next_available_at = next_retry_at(now_ms(), job.retry_count, self.base_delay_ms);
            self.queue.retry(&job.id, next_available_at).await?;
            self.observer
                .log(
                    ActionKind::JobRetry,
                    Severity::Warning,
                    json!({"jobId": job.id, "error": error.to_string(), "nextAvailableAt": next_available_at}),
                )
                .await?;
        }
        Ok(())
    }
}

/// `now + 2^(retryCount+1) * BASE_DELAY_MS + uniform(0, BASE_DELAY_MS)`.
fn next_retry_at(now: i64, retry_count: u32, base_delay_ms: u64) -> i64 {
    let exponential = 2i64.saturating_pow(retry_count + 1).saturating_mul(base_delay_ms as i64);
    let jitter = if base_delay_ms == 0 {
        0
    } else {
        fastrand::u64(0..base_delay_ms) as i64
    };
    now + exponential + jitter
}
