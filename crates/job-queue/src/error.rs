use cache_store::StoreError;
use discovery_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue backend unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("job {0} not found")]
    NotFound(String),
}

impl QueueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Store(e) => e.kind(),
            QueueError::NotFound(_) => ErrorKind::QueueUnavailable,
        }
    }
}
