//! A thin, column-family-aware handle into one rocksdb transaction.

use rocksdb::{Direction, IteratorMode};

use crate::{Db, StoreError};

pub struct Txn<'a> {
    db: &'a Db,
    txn: &'a rocksdb::Transaction<'a, Db>,
}

impl<'a> Txn<'a> {
    pub(crate) fn new(db: &'a Db, txn: &'a rocksdb::Transaction<'a, Db>) -> Self {
        Self { db, txn }
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::UnknownColumnFamily(name.to_string()))
    }

    pub fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.txn.get_cf(self.cf(cf)?, key)?)
    }

    /// Point read that also takes an exclusive lock on `key` for the
    /// lifetime of this transaction, so a concurrent transaction reading the
    /// same key for update blocks (or conflicts at commit) instead of both
    /// succeeding.
    pub fn get_for_update(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.txn.get_for_update_cf(self.cf(cf)?, key, true)?)
    }

    pub fn put(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        Ok(self.txn.put_cf(self.cf(cf)?, key, value)?)
    }

    pub fn delete(&self, cf: &str, key: &[u8]) -> Result<(), StoreError> {
        Ok(self.txn.delete_cf(self.cf(cf)?, key)?)
    }

    /// Ordered scan of `cf` starting at `start` (inclusive), ascending.
    pub fn scan_from(
        &self,
        cf: &str,
        start: &[u8],
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let iter = self
            .txn
            .iterator_cf(self.cf(cf)?, IteratorMode::From(start, Direction::Forward));
        let mut out = Vec::new();
        for item in iter {
            let (key, value) = item?;
            out.push((key.to_vec(), value.to_vec()));
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }
}
