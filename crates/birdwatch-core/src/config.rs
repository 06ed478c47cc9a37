//! Process configuration, loaded from the environment.

use envconfig::Envconfig;

/// All tunables from the configuration option table, loaded once at process
/// start via [`Envconfig::init_from_env`].
#[derive(Debug, Clone, Envconfig)]
pub struct Config {
    /// Admission surface listen port.
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    /// Filesystem location of the queue store.
    #[envconfig(from = "QUEUE_DB_PATH", default = "./data/queue")]
    pub queue_db_path: String,

    /// Filesystem location of the event log.
    #[envconfig(from = "OBSERVER_DB_PATH", default = "./data/observer")]
    pub observer_db_path: String,

    /// Worker tick interval, in milliseconds.
    #[envconfig(from = "POLL_INTERVAL_MS", default = "250")]
    pub poll_interval_ms: u64,

    /// Backoff base, in milliseconds.
    #[envconfig(from = "BASE_DELAY_MS", default = "1000")]
    pub base_delay_ms: u64,

    /// Maximum `retryCount` before a job is permanently failed.
    #[envconfig(from = "MAX_RETRIES", default = "5")]
    pub max_retries: u32,

    /// Default metrics window, in milliseconds (default 3 hours).
    #[envconfig(from = "DEFAULT_METRICS_WINDOW_MS", default = "10800000")]
    pub default_metrics_window_ms: i64,

    /// Alert threshold on `failureRate`, in `[0, 1]`.
    #[envconfig(from = "FAILURE_RATE_THRESHOLD", default = "0.5")]
    pub failure_rate_threshold: f64,

    /// Key width `W` for ms-timestamp padding.
    #[envconfig(from = "TIMESTAMP_PAD_LENGTH", default = "13")]
    pub timestamp_pad_length: usize,

    /// Number of worker agents to launch.
    #[envconfig(from = "WORKER_CONCURRENCY", default = "4")]
    pub worker_concurrency: usize,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
