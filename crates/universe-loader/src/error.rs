use discovery_core::ErrorKind;
use market_data_client::ClientError;

#[derive(Debug, thiserror::Error)]
pub enum UniverseError {
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] ClientError),

    #[error("universe coverage floor breached: got {actual} rows, required at least {required}")]
    CoverageFloor { actual: usize, required: usize },
}

impl UniverseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UniverseError::Upstream(e) => e.kind(),
            UniverseError::CoverageFloor { .. } => ErrorKind::UniverseFloorBreached,
        }
    }
}
