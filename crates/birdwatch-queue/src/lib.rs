//! The durable job queue: a primary job table keyed by job id, plus a
//! secondary index ordering eligible jobs by `(availableAt, id)`.
//!
//! Every mutating operation here is one rocksdb transaction (via
//! `birdwatch_storage::Store::with_transaction`), the same "one command, one
//! transaction" discipline the Postgres-backed `PgJobStore` this crate is
//! descended from uses — `claim`'s exclusivity comes from
//! `Transaction::get_for_update_cf`, rocksdb's analogue of Postgres's
//! `SELECT ... FOR UPDATE`.
//!
//! # Schema
//!
//! Two column families share one rocksdb environment:
//!
//! - `jobs`: job id -> JSON-encoded [`Job`]
//! - `queue-index`: `pad(availableAt, W) || "-" || id` -> job id, present iff
//!   the job's status is `queued`

mod error;
mod key;

use std::path::Path;

use birdwatch_core::{canonical_id, now_ms, Job, JobStatus};
use birdwatch_storage::Store;
use serde_json::Value;

pub use error::QueueError;
use key::{index_key, parse_available_at};

pub const JOBS_CF: &str = "jobs";
pub const INDEX_CF: &str = "queue-index";

/// Outcome of [`Queue::submit`].
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub job: Job,
    pub is_duplicate: bool,
}

/// Point-in-time counts per job status, for the admission surface's
/// `/metrics` endpoint and for tests asserting queue health directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

/// The durable job queue.
#[derive(Clone)]
pub struct Queue {
    store: Store,
    pad_width: usize,
}

impl Queue {
    /// Open the queue's database at `path`. `pad_width` is `W` from the
    /// configuration table (`TIMESTAMP_PAD_LENGTH`); it must stay constant
    /// across the lifetime of a database, since it is baked into every
    /// index key already written.
    pub fn open(path: impl AsRef<Path>, pad_width: usize) -> Result<Self, QueueError> {
        let store = Store::open(path, &[JOBS_CF, INDEX_CF])?;
        Ok(Self { store, pad_width })
    }

    /// Submit a research request by name. Returns the existing record
    /// unchanged (`is_duplicate = true`) if a non-`failed` record already
    /// exists for its canonical id; resets a `failed` record to a fresh,
    /// immediately-eligible one; otherwise creates a new record.
    pub async fn submit(&self, name: &str) -> Result<SubmitOutcome, QueueError> {
        let id = canonical_id(name);
        let name = name.to_string();
        let now = now_ms();
        let width = self.pad_width;

        self.store
            .with_transaction(move |txn| {
                let existing = txn.get_for_update(JOBS_CF, id.as_bytes())?;
                if let Some(bytes) = existing {
                    let job: Job = decode_job(&bytes)?;
                    if job.status != JobStatus::Failed {
                        return Ok(SubmitOutcome {
                            job,
                            is_duplicate: true,
                        });
                    }
                }

                let fresh = Job::fresh(id.clone(), name.clone(), now);
                write_job_and_index(txn, &fresh, width)?;
                Ok(SubmitOutcome {
                    job: fresh,
                    is_duplicate: false,
                })
            })
            .await
    }

    /// Claim the next eligible job, transitioning it `queued -> processing`
    /// and removing its index entry. Returns `None` if the index is empty,
    /// if its head is not yet eligible, or if it lost a race to another
    /// concurrent `claim`.
    pub async fn claim(&self) -> Result<Option<Job>, QueueError> {
        let now = now_ms();
        let width = self.pad_width;

        self.store
            .with_transaction(move |txn| {
                let head = txn.scan_from(INDEX_CF, &[], Some(1))?;
                let Some((key, value)) = head.into_iter().next() else {
                    return Ok(None);
                };

                let Some(available_at) = parse_available_at(&key, width) else {
                    return Err(QueueError::MalformedIndexKey);
                };
                if available_at > now {
                    return Ok(None);
                }

                let id = String::from_utf8(value).map_err(|_| QueueError::MalformedIndexKey)?;

                let job_bytes = match txn.get_for_update(JOBS_CF, id.as_bytes()) {
                    Ok(bytes) => bytes,
                    Err(e) if e.is_lock_contention() => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let Some(job_bytes) = job_bytes else {
                    // Index entry with no backing job record: self-heal by
                    // dropping the orphan and reporting no claim.
                    txn.delete(INDEX_CF, &key)?;
                    return Ok(None);
                };

                let mut job: Job = decode_job(&job_bytes)?;
                if job.status != JobStatus::Queued {
                    // Lost a race with another transaction that already
                    // claimed this job between our scan and our lock.
                    return Ok(None);
                }

                job.status = JobStatus::Processing;
                txn.delete(INDEX_CF, &key)?;
                txn.put(JOBS_CF, id.as_bytes(), &encode_job(&job)?)?;
                Ok(Some(job))
            })
            .await
    }

    /// Mark a job completed with its result body. No index mutation: a
    /// `processing` job has no index entry to begin with.
    pub async fn complete(&self, id: &str, body: Value) -> Result<Option<Job>, QueueError> {
        let id = id.to_string();
        self.store
            .with_transaction(move |txn| {
                let Some(bytes) = txn.get_for_update(JOBS_CF, id.as_bytes())? else {
                    return Ok(None);
                };
                let mut job: Job = decode_job(&bytes)?;
                job.status = JobStatus::Completed;
                job.body = body;
                txn.put(JOBS_CF, id.as_bytes(), &encode_job(&job)?)?;
                Ok(Some(job))
            })
            .await
    }

    /// Return a job to `queued` with an incremented `retryCount` and a new
    /// `availableAt`, re-inserting its index entry.
    pub async fn retry(&self, id: &str, next_available_at: i64) -> Result<Option<Job>, QueueError> {
        let id = id.to_string();
        let width = self.pad_width;
        self.store
            .with_transaction(move |txn| {
                let Some(bytes) = txn.get_for_update(JOBS_CF, id.as_bytes())? else {
                    return Ok(None);
                };
                let mut job: Job = decode_job(&bytes)?;
                job.status = JobStatus::Queued;
                job.retry_count += 1;
                job.available_at = next_available_at;
                txn.put(JOBS_CF, id.as_bytes(), &encode_job(&job)?)?;
                txn.put(
                    INDEX_CF,
                    &index_key(next_available_at, &job.id, width),
                    job.id.as_bytes(),
                )?;
                Ok(Some(job))
            })
            .await
    }

    /// Permanently fail a job. No index entry; the record is retained until
    /// resubmission.
    pub async fn fail(&self, id: &str) -> Result<Option<Job>, QueueError> {
        let id = id.to_string();
        self.store
            .with_transaction(move |txn| {
                let Some(bytes) = txn.get_for_update(JOBS_CF, id.as_bytes())? else {
                    return Ok(None);
                };
                let mut job: Job = decode_job(&bytes)?;
                job.status = JobStatus::Failed;
                txn.put(JOBS_CF, id.as_bytes(), &encode_job(&job)?)?;
                Ok(Some(job))
            })
            .await
    }

    /// Point read by job id.
    pub async fn get(&self, id: &str) -> Result<Option<Job>, QueueError> {
        let bytes = self.store.get(JOBS_CF, id.as_bytes().to_vec()).await?;
        bytes.map(|b| decode_job(&b)).transpose()
    }

    /// Counts per job status, computed by a full scan of the job table.
    pub async fn stats(&self) -> Result<QueueStats, QueueError> {
        let rows = self.store.scan_from(JOBS_CF, Vec::new(), None).await?;
        let mut stats = QueueStats::default();
        for (_, value) in rows {
            match decode_job(&value)?.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    /// Number of entries in the secondary index, for asserting index
    /// consistency (P2) directly in tests.
    pub async fn len_index(&self) -> Result<usize, QueueError> {
        Ok(self.store.scan_from(INDEX_CF, Vec::new(), None).await?.len())
    }
}

fn encode_job(job: &Job) -> Result<Vec<u8>, QueueError> {
    Ok(serde_json::to_vec(job)?)
}

fn decode_job(bytes: &[u8]) -> Result<Job, QueueError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn write_job_and_index(
    txn: &birdwatch_storage::Txn<'_>,
    job: &Job,
    width: usize,
) -> Result<(), QueueError> {
    txn.put(JOBS_CF, job.id.as_bytes(), &encode_job(job)?)?;
    txn.put(
        INDEX_CF,
        &index_key(job.available_at, &job.id, width),
        job.id.as_bytes(),
    )?;
    Ok(())
}
