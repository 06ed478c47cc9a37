//! The job record and its lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Status a job occupies at any instant. See the queue invariants for the
/// allowed transitions between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// A unit of research work, keyed by a canonical id derived from its name.
///
/// At most one record exists per `id` at any instant; the queue's secondary
/// index carries an entry for this job if and only if `status == Queued`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub available_at: i64,
    pub retry_count: u32,
    pub status: JobStatus,
    pub body: Value,
}

impl Job {
    /// Build a fresh, immediately-eligible job for submission or resubmission.
    pub fn fresh(id: String, name: String, now: i64) -> Self {
        Self {
            id,
            name,
            created_at: now,
            available_at: now,
            retry_count: 0,
            status: JobStatus::Queued,
            body: json!({}),
        }
    }
}

/// Derive a job's canonical, deduplicating id from its request name:
/// lowercase, with each run of whitespace collapsed to a single hyphen.
pub fn canonical_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            id.push('-');
            in_whitespace = false;
        }
        id.extend(ch.to_lowercase());
    }
    id
}
