//! The external research collaborator the worker drives.

use async_trait::async_trait;
use serde_json::Value;

use crate::job::Job;

/// Given a job, produce its result body or fail. Implementations own their
/// own IO; the worker only knows how to call `process` and interpret the
/// `Result`.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, job: &Job) -> anyhow::Result<Value>;
}
