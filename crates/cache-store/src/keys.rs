/// Canonical key layout. Every caller goes through these builders rather than
/// hand-formatting strings, so the key-space stays consistent across the coordinator,
/// worker, and gateway.
pub fn contenders(strategy: &str) -> String {
    format!("discovery:contenders:{strategy}")
}

pub fn contenders_last(strategy: &str) -> String {
    format!("discovery:contenders:last:{strategy}")
}

pub fn status(job_id: &str) -> String {
    format!("discovery:status:{job_id}")
}

pub const HEARTBEAT: &str = "worker:heartbeat";

pub fn lock(strategy: &str) -> String {
    format!("discovery:lock:{strategy}")
}

/// Tracks the in-flight job for a strategy so the gateway can dedupe concurrent
/// `get_candidates` misses into a single enqueue rather than flooding the queue.
pub fn pending(strategy: &str) -> String {
    format!("discovery:pending:{strategy}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_strategy() {
        assert_eq!(contenders("swing"), "discovery:contenders:swing");
        assert_eq!(contenders_last("swing"), "discovery:contenders:last:swing");
        assert_eq!(status("job-1"), "discovery:status:job-1");
        assert_eq!(lock("swing"), "discovery:lock:swing");
        assert_eq!(pending("swing"), "discovery:pending:swing");
    }
}
