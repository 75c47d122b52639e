/// Progress snapshot emitted after each scoring chunk. The coordinator has no opinion on
/// where this goes — the worker wires it to the job queue's status record.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub progress_pct: u8,
    pub stage_label: String,
    pub scanned_so_far: usize,
    pub trade_ready_so_far: usize,
}

pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Drops every update. Used by callers that only care about the final result.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _update: ProgressUpdate) {}
}
