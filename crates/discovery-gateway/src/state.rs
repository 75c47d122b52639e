use std::sync::Arc;

use cache_store::Store;
use discovery_core::DiscoveryConfig;
use job_queue::JobQueue;
use pipeline_coordinator::PipelineCoordinator;

/// Shared handles every handler needs. Cheap to clone: `Store` wraps a
/// `ConnectionManager`, `JobQueue`/`PipelineCoordinator` are held behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub queue: Arc<JobQueue>,
    pub coordinator: Arc<PipelineCoordinator>,
    pub config: Arc<DiscoveryConfig>,
}
