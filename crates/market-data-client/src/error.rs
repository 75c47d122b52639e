use discovery_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("upstream request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("rate limited by upstream after {attempts} consecutive 429s")]
    RateLimited { attempts: u32 },

    #[error("upstream returned {status} after retries exhausted")]
    Upstream5xx { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Timeout(_) => ErrorKind::Timeout,
            ClientError::RateLimited { .. } => ErrorKind::RateLimited,
            ClientError::Upstream5xx { .. } => ErrorKind::Upstream5xx,
            ClientError::Malformed(_) => ErrorKind::Malformed,
        }
    }
}
