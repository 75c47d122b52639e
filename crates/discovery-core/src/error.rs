use serde::{Deserialize, Serialize};

/// The error taxonomy from the design's error-handling section: kinds, not types. Each
/// crate boundary defines its own `thiserror` enum for the errors it can actually produce
/// and maps each variant to one of these kinds for logging, job records, and the gateway's
/// JSON error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorKind {
    Configuration,
    Timeout,
    RateLimited,
    Upstream5xx,
    Malformed,
    UniverseFloorBreached,
    LockContended,
    ScoringSkipped,
    CacheUnavailable,
    QueueUnavailable,
    JobTimeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "Configuration",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::Upstream5xx => "Upstream5xx",
            ErrorKind::Malformed => "Malformed",
            ErrorKind::UniverseFloorBreached => "UniverseFloorBreached",
            ErrorKind::LockContended => "LockContended",
            ErrorKind::ScoringSkipped => "ScoringSkipped",
            ErrorKind::CacheUnavailable => "CacheUnavailable",
            ErrorKind::QueueUnavailable => "QueueUnavailable",
            ErrorKind::JobTimeout => "JobTimeout",
        }
    }

    /// Recoverable errors are ones the coordinator counts and continues past; the rest
    /// abort the run.
    pub fn is_recoverable_at_call_site(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::RateLimited | ErrorKind::Upstream5xx | ErrorKind::Malformed
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
