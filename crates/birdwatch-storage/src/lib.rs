//! # birdwatch-storage
//!
//! The persistence adapter: a process-wide handle cache over an embedded,
//! ordered, transactional key-value store (rocksdb), exposing point
//! `get`/`put`/`delete`, an ordered range scan, and an atomic group write
//! that can span multiple column families sharing one environment.
//!
//! `birdwatch-queue` and `birdwatch-observer` are the only consumers of this
//! crate; neither knows rocksdb exists past this module boundary.

mod error;
mod handle_cache;
mod txn;

use std::path::Path;
use std::sync::Arc;

use rocksdb::{MultiThreaded, TransactionDB};

pub use error::StoreError;
pub use txn::Txn;

/// The concrete backing database type. Column families are created lazily
/// on first open and shared by every `Store` handle for a given path.
pub type Db = TransactionDB<MultiThreaded>;

/// One write to apply as part of an atomic group write.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put {
        cf: &'static str,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: &'static str,
        key: Vec<u8>,
    },
}

/// A handle to one rocksdb environment, shared process-wide per path via
/// [`Store::open`]'s handle cache.
#[derive(Clone)]
pub struct Store {
    db: Arc<Db>,
}

impl Store {
    /// Open (or reuse, from the process-wide handle cache) the database at
    /// `path`, ensuring `column_families` exist.
    pub fn open(path: impl AsRef<Path>, column_families: &[&str]) -> Result<Self, StoreError> {
        let db = handle_cache::open(path.as_ref(), column_families)?;
        Ok(Self { db })
    }

    pub async fn get(&self, cf: &'static str, key: Vec<u8>) -> Result<Option<Vec<u8>>, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let txn = db.transaction();
            Txn::new(&db, &txn).get(cf, &key)
        })
        .await?
    }

    pub async fn put(&self, cf: &'static str, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.with_transaction(move |txn| txn.put(cf, &key, &value)).await
    }

    pub async fn delete(&self, cf: &'static str, key: Vec<u8>) -> Result<(), StoreError> {
        self.with_transaction(move |txn| txn.delete(cf, &key)).await
    }

    /// Ordered scan of `cf` starting at `start` (inclusive), ascending, with
    /// an optional result limit.
    pub async fn scan_from(
        &self,
        cf: &'static str,
        start: Vec<u8>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let txn = db.transaction();
            Txn::new(&db, &txn).scan_from(cf, &start, limit)
        })
        .await?
    }

    /// Apply `ops` as one atomic group write: either every put/delete in
    /// `ops` becomes visible together, or none do.
    pub async fn atomic_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        self.with_transaction(move |txn| {
            for op in &ops {
                match op {
                    WriteOp::Put { cf, key, value } => txn.put(cf, key, value)?,
                    WriteOp::Delete { cf, key } => txn.delete(cf, key)?,
                }
            }
            Ok(())
        })
        .await
    }

    /// Run `f` against a dedicated transaction on a blocking thread,
    /// committing on success and rolling back on error. Every other
    /// mutating method on `Store` is built on top of this; callers that need
    /// `get_for_update` semantics (the queue's `claim`) use it directly.
    ///
    /// `f`'s error type only needs `From<StoreError>`, so callers can use
    /// `?` on both `Txn` operations and their own domain errors (e.g.
    /// deserialization failures) inside the closure.
    pub async fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Txn<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let db = self.db.clone();
        let result = tokio::task::spawn_blocking(move || {
            let txn = db.transaction();
            match f(&Txn::new(&db, &txn)) {
                Ok(value) => match txn.commit() {
                    Ok(()) => Ok(value),
                    Err(e) => Err(E::from(StoreError::from(e))),
                },
                Err(e) => {
                    let _ = txn.rollback();
                    Err(e)
                }
            }
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(join_err) => Err(E::from(StoreError::from(join_err))),
        }
    }
}

/// Shutdown hook: closes every cached database handle in the process.
pub fn close_all() {
    handle_cache::close_all();
}
