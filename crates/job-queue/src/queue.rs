use cache_store::Store;
use chrono::Utc;
use discovery_core::{DiscoveryJob, JobRecord};

use crate::error::QueueError;

const DEFAULT_RESULT_TTL_SECONDS: u64 = 3600;
const QUEUE_NAME: &str = "discovery";

fn queue_key(name: &str) -> String {
    format!("discovery:queue:{name}")
}

/// FIFO of discovery jobs backed by the same store as the candidate cache, in its own
/// key-space. Job bodies live under `discovery:status:<id>`; the queue list itself only
/// ever carries job ids, so a `JobRecord` can be updated in place without touching the
/// list ordering.
pub struct JobQueue {
    store: Store,
    result_ttl_seconds: u64,
}

impl JobQueue {
    pub fn new(store: Store) -> Self {
        Self { store, result_ttl_seconds: DEFAULT_RESULT_TTL_SECONDS }
    }

    pub fn with_result_ttl(mut self, ttl_seconds: u64) -> Self {
        self.result_ttl_seconds = ttl_seconds;
        self
    }

    pub async fn enqueue(&self, job: DiscoveryJob) -> Result<String, QueueError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let record = JobRecord::new_queued(job_id.clone(), &job);

        self.store
            .set_json(&cache_store::keys::status(&job_id), &record, self.result_ttl_seconds)
            .await?;
        self.store.rpush(&queue_key(QUEUE_NAME), job_id.as_bytes()).await?;

        Ok(job_id)
    }

    pub async fn fetch(&self, job_id: &str) -> Result<JobRecord, QueueError> {
        self.store
            .get_json(&cache_store::keys::status(job_id))
            .await?
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))
    }

    pub async fn update(&self, record: &JobRecord) -> Result<(), QueueError> {
        self.store
            .set_json(&cache_store::keys::status(&record.job_id), record, self.result_ttl_seconds)
            .await
            .map_err(QueueError::from)
    }

    /// Blocks cooperatively until a job id is available on any of `queues`, then returns
    /// its current `JobRecord`. A 5s poll interval lets the caller periodically check a
    /// shutdown flag without busy-looping.
    pub async fn poll_ready(&self, queues: &[&str]) -> Result<Option<JobRecord>, QueueError> {
        let keys: Vec<String> = queues.iter().map(|q| queue_key(q)).collect();
        let Some((_, job_id_bytes)) = self.store.blpop(&keys, 5.0).await? else {
            return Ok(None);
        };
        let job_id = String::from_utf8_lossy(&job_id_bytes).to_string();
        self.fetch(&job_id).await.map(Some)
    }

    pub async fn mark_running(&self, job_id: &str) -> Result<JobRecord, QueueError> {
        let mut record = self.fetch(job_id).await?;
        record.mark_running(Utc::now());
        self.update(&record).await?;
        Ok(record)
    }

    pub async fn mark_finished(&self, job_id: &str, result_ref: String) -> Result<JobRecord, QueueError> {
        let mut record = self.fetch(job_id).await?;
        record.mark_finished(Utc::now(), result_ref);
        self.update(&record).await?;
        Ok(record)
    }

    pub async fn mark_failed(
        &self,
        job_id: &str,
        error_kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<JobRecord, QueueError> {
        let mut record = self.fetch(job_id).await?;
        record.mark_failed(Utc::now(), error_kind, message);
        self.update(&record).await?;
        Ok(record)
    }
}
