use discovery_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to decode cached JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable(_) => ErrorKind::CacheUnavailable,
            StoreError::Decode(_) => ErrorKind::Malformed,
        }
    }
}
