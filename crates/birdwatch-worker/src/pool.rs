use std::sync::Arc;

use birdwatch_core::{Config, Processor};
use birdwatch_observer::Observer;
use birdwatch_queue::Queue;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::worker::Worker;

/// A running pool of `WORKER_CONCURRENCY` workers, all claiming from the
/// same queue independently. Dropping the shutdown signal (via
/// [`WorkerPool::shutdown`]) stops every worker after its current tick.
pub struct WorkerPool {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        count: usize,
        queue: Queue,
        observer: Observer,
        processor: Arc<dyn Processor>,
        config: &Config,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(count);

        for _ in 0..count {
            let worker = Worker::new(queue.clone(), observer.clone(), processor.clone(), config);
            let rx = shutdown_rx.clone();
            handles.push(tokio::spawn(async move { worker.run(rx).await }));
        }

        Self {
            shutdown_tx,
            handles,
        }
    }

    /// Signal every worker to stop after its current tick and wait for them
    /// to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
