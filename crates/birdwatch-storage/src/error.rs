use thiserror::Error;

/// Errors surfaced by the persistence adapter. Every mutating `Store` method
/// either returns `Ok` with its write fully committed or `Err` with nothing
/// committed; there is no partial-state outcome.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rocksdb error: {0}")]
    Db(#[from] rocksdb::Error),

    #[error("unknown column family '{0}'")]
    UnknownColumnFamily(String),

    #[error("store task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StoreError {
    /// True if this error represents lock contention from a concurrent
    /// transaction (rocksdb's `Busy`/`TimedOut`) rather than a genuine I/O
    /// failure. Callers racing on the same key — the queue's `claim` is the
    /// one place this matters — treat it as "nothing to do this tick"
    /// rather than as a hard error, the same way Postgres's `FOR UPDATE SKIP
    /// LOCKED` lets a loser move on instead of blocking or failing.
    pub fn is_lock_contention(&self) -> bool {
        matches!(
            self,
            StoreError::Db(e) if matches!(e.kind(), rocksdb::ErrorKind::Busy | rocksdb::ErrorKind::TimedOut)
        )
    }
}
