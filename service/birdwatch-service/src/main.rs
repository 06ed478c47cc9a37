//! Process bootstrap: loads configuration, opens the queue and observer
//! stores, spawns the worker pool, and serves the admission surface until
//! asked to shut down.

use std::sync::Arc;

use birdwatch_core::Config;
use birdwatch_observer::Observer;
use birdwatch_queue::Queue;
use birdwatch_server::{build_router, AppState};
use birdwatch_worker::{WikipediaProcessor, WorkerPool};
use envconfig::Envconfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("invalid configuration");

    let queue = Queue::open(&config.queue_db_path, config.timestamp_pad_length)?;
    let observer = Observer::open(
        &config.observer_db_path,
        config.timestamp_pad_length,
        config.default_metrics_window_ms,
        config.failure_rate_threshold,
    )?;

    let processor = Arc::new(WikipediaProcessor::new()?);
    let pool = WorkerPool::spawn(
        config.worker_concurrency,
        queue.clone(),
        observer.clone(),
        processor,
        &config,
    );

    let state = AppState {
        queue,
        observer,
        config: Arc::new(config.clone()),
    };
    let router = build_router(state);

    let bind = config.bind();
    info!(%bind, "birdwatch listening");
    let listener = tokio::net::TcpListener::bind(&bind).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down worker pool");
    pool.shutdown().await;
    birdwatch_storage::close_all();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
}
