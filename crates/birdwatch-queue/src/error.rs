use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] birdwatch_storage::StoreError),

    #[error("job record serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("malformed index key")]
    MalformedIndexKey,
}
