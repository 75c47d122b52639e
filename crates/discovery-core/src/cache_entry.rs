use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The store's unit of value: every payload carries its own write time, TTL, and schema
/// version rather than relying solely on the backing store's native expiry. This is what
/// lets readers judge "fresh vs stale" uniformly, including for the heartbeat, which is
/// otherwise tempting to store as a bare byte string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub written_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub schema_version: u32,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T, ttl_seconds: u64) -> Self {
        Self {
            payload,
            written_at: Utc::now(),
            ttl_seconds,
            schema_version: crate::result::SCHEMA_VERSION,
        }
    }

    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.written_at).num_seconds().max(0)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age_seconds(now) < self.ttl_seconds as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_within_ttl_stale_after() {
        let entry = CacheEntry::new(42u32, 60);
        assert!(entry.is_fresh(entry.written_at));
        assert!(entry.is_fresh(entry.written_at + Duration::seconds(59)));
        assert!(!entry.is_fresh(entry.written_at + Duration::seconds(61)));
    }

    #[test]
    fn heartbeat_boundary_119_vs_121_seconds() {
        let entry = CacheEntry::new((), 120);
        assert!(entry.is_fresh(entry.written_at + Duration::seconds(119)));
        assert!(!entry.is_fresh(entry.written_at + Duration::seconds(121)));
    }
}
