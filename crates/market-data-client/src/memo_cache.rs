use chrono::Utc;
use dashmap::DashMap;
use discovery_core::CacheEntry;

/// Short-lived client-local memo, keyed by `(endpoint, params)`, to absorb bursts of
/// identical requests during a single pipeline run. Not a replacement for the shared
/// cache store — this never leaves process memory and defaults to a 60s ceiling.
pub struct MemoCache {
    entries: DashMap<String, CacheEntry<Vec<u8>>>,
    ttl_seconds: u64,
}

impl MemoCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_seconds: ttl_seconds.min(60),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(Utc::now()) {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: String, body: Vec<u8>) {
        self.entries.insert(key, CacheEntry::new(body, self.ttl_seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_for_missing_key() {
        let cache = MemoCache::new(60);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn returns_fresh_entry() {
        let cache = MemoCache::new(60);
        cache.put("k".into(), b"payload".to_vec());
        assert_eq!(cache.get("k"), Some(b"payload".to_vec()));
    }
}
