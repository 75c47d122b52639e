use job_queue::JobQueue;
use pipeline_coordinator::{ProgressSink, ProgressUpdate};
use std::sync::Arc;

/// Bridges the coordinator's progress callbacks to the job queue's `JobRecord`, so a poll
/// against `/discovery/status` sees live `progress_pct`/`stage_label` during a run, not just
/// a final state flip.
pub struct JobQueueProgressSink {
    queue: Arc<JobQueue>,
    job_id: String,
}

impl JobQueueProgressSink {
    pub fn new(queue: Arc<JobQueue>, job_id: String) -> Self {
        Self { queue, job_id }
    }
}

impl ProgressSink for JobQueueProgressSink {
    fn report(&self, update: ProgressUpdate) {
        let queue = self.queue.clone();
        let job_id = self.job_id.clone();
        tokio::spawn(async move {
            if let Ok(mut record) = queue.fetch(&job_id).await {
                record.update_progress(
                    update.progress_pct,
                    format!(
                        "{} ({} scanned, {} trade-ready)",
                        update.stage_label, update.scanned_so_far, update.trade_ready_so_far
                    ),
                );
                if let Err(e) = queue.update(&record).await {
                    tracing::warn!("failed to persist progress update: {e}");
                }
            }
        });
    }
}
