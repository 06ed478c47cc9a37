//! Observer event shapes: facts recorded by the queue, worker, and admission
//! surface, and read back by tracing and metrics.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Severity a logged event carries. Only `Error`-severity `job-failed`
/// events feed the alert check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Log,
    Warning,
    Error,
}

/// The enumerated kinds of events the system records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    JobSubmitted,
    JobDuplicate,
    JobClaimed,
    JobCompleted,
    JobRetry,
    JobFailed,
    ApiRequest,
    WorkerStart,
}

/// An immutable observer log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: i64,
    pub severity: Severity,
    pub action: ActionKind,
    pub body: Value,
}

impl Event {
    pub fn new(id: Uuid, timestamp: i64, severity: Severity, action: ActionKind, body: Value) -> Self {
        Self {
            id,
            timestamp,
            severity,
            action,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kinds_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_value(ActionKind::JobSubmitted).unwrap(),
            "job-submitted"
        );
        assert_eq!(
            serde_json::to_value(ActionKind::ApiRequest).unwrap(),
            "api-request"
        );
    }
}
