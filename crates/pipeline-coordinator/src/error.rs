use cache_store::StoreError;
use discovery_core::ErrorKind;
use scorer::ScorerError;
use universe_loader::UniverseError;

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("strategy {0} already has a run in progress")]
    LockHeld(String),

    #[error("universe stage failed: {0}")]
    Universe(#[from] UniverseError),

    #[error("scoring stage failed: {0}")]
    Scoring(#[from] ScorerError),

    #[error("cache store failed: {0}")]
    Store(#[from] StoreError),

    #[error("lock lost mid-run for strategy {0}")]
    LockLost(String),
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::LockHeld(_) => ErrorKind::LockContended,
            CoordinatorError::Universe(e) => e.kind(),
            CoordinatorError::Scoring(e) => e.kind(),
            CoordinatorError::Store(e) => e.kind(),
            CoordinatorError::LockLost(_) => ErrorKind::LockContended,
        }
    }
}
