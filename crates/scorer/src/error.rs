use discovery_core::ErrorKind;
use market_data_client::ClientError;

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("upstream fetch failed while scoring: {0}")]
    Upstream(#[from] ClientError),

    #[error("symbol {symbol} has only {bars} historical bars, need at least 20")]
    InsufficientHistory { symbol: String, bars: usize },
}

impl ScorerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScorerError::Upstream(e) => e.kind(),
            ScorerError::InsufficientHistory { .. } => ErrorKind::ScoringSkipped,
        }
    }
}
