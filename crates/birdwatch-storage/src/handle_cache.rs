//! A path-keyed cache of open database handles.
//!
//! The same database path must resolve to the same `TransactionDB` instance
//! within the process: the queue's atomic claim needs its job table and its
//! index table to share one environment so they can be written inside a
//! single transaction. Opening the path twice would give each table its own
//! environment and break that.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use rocksdb::{ColumnFamilyDescriptor, MultiThreaded, Options, TransactionDB, TransactionDBOptions};

use crate::{Db, StoreError};

static HANDLES: Lazy<DashMap<PathBuf, Arc<Db>>> = Lazy::new(DashMap::new);

// Only guards the open-if-absent check below; once a handle is cached, reads
// of it never take this lock.
static OPEN_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn open(path: &Path, column_families: &[&str]) -> Result<Arc<Db>, StoreError> {
    let path = path.to_path_buf();

    if let Some(db) = HANDLES.get(&path) {
        return Ok(db.clone());
    }

    let _guard = OPEN_LOCK.lock().expect("store handle cache lock poisoned");
    if let Some(db) = HANDLES.get(&path) {
        return Ok(db.clone());
    }

    let mut db_opts = Options::default();
    db_opts.create_if_missing(true);
    db_opts.create_missing_column_families(true);
    let txn_opts = TransactionDBOptions::default();
    let cf_descriptors: Vec<ColumnFamilyDescriptor> = column_families
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
        .collect();

    let db: Db = TransactionDB::<MultiThreaded>::open_cf_descriptors(
        &db_opts,
        &txn_opts,
        &path,
        cf_descriptors,
    )?;
    let db = Arc::new(db);
    HANDLES.insert(path, db.clone());
    Ok(db)
}

/// Drop every cached handle, flushing each database's WAL.
pub fn close_all() {
    HANDLES.clear();
}
