use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error(transparent)]
    Store(#[from] birdwatch_storage::StoreError),

    #[error("event record serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
