use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Finished,
    Failed,
}

/// A unit of work enqueued against the job queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryJob {
    pub strategy: String,
    pub limit: usize,
    pub enqueued_at: DateTime<Utc>,
    pub timeout_seconds: u64,
}

/// Tracked state of one job, from enqueue through completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub strategy: String,
    pub state: JobState,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub progress_pct: u8,
    pub stage_label: String,
    /// Cache key under which the finished result can be fetched, once `state == Finished`.
    pub result_ref: Option<String>,
    pub error: Option<JobError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub error_kind: String,
    pub message: String,
}

impl JobRecord {
    pub fn new_queued(job_id: String, job: &DiscoveryJob) -> Self {
        Self {
            job_id,
            strategy: job.strategy.clone(),
            state: JobState::Queued,
            enqueued_at: job.enqueued_at,
            started_at: None,
            finished_at: None,
            progress_pct: 0,
            stage_label: "queued".to_string(),
            result_ref: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self, now: DateTime<Utc>) {
        self.state = JobState::Running;
        self.started_at = Some(now);
        self.stage_label = "running".to_string();
    }

    pub fn mark_finished(&mut self, now: DateTime<Utc>, result_ref: String) {
        self.state = JobState::Finished;
        self.finished_at = Some(now);
        self.progress_pct = 100;
        self.stage_label = "finished".to_string();
        self.result_ref = Some(result_ref);
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>, error_kind: impl Into<String>, message: impl Into<String>) {
        self.state = JobState::Failed;
        self.finished_at = Some(now);
        self.stage_label = "failed".to_string();
        self.error = Some(JobError {
            error_kind: error_kind.into(),
            message: message.into(),
        });
    }

    pub fn update_progress(&mut self, progress_pct: u8, stage_label: impl Into<String>) {
        self.progress_pct = progress_pct;
        self.stage_label = stage_label.into();
    }
}
