mod coordinator;
mod error;
mod lock;
mod progress;

pub use coordinator::{null_progress_sink, CoordinatorConfig, PipelineCoordinator};
pub use error::CoordinatorError;
pub use lock::StrategyLock;
pub use progress::{NullProgressSink, ProgressSink, ProgressUpdate};
