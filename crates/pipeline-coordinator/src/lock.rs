use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cache_store::{keys, Store};
use tokio::task::JoinHandle;

/// Distributed single-writer lock acquired via atomic set-if-absent with a TTL. The holder
/// refreshes it on a background task; if a refresh fails (e.g. a network partition) the
/// lock is considered lost and `is_lost()` flips so the run can abort rather than keep
/// writing as if it still held exclusivity.
pub struct StrategyLock {
    strategy: String,
    store: Store,
    token: String,
    lost: Arc<AtomicBool>,
    refresh_task: JoinHandle<()>,
}

impl StrategyLock {
    /// Attempts to acquire the lock for `strategy` with the given TTL (job timeout + margin).
    /// Returns `None` if another holder already has it.
    pub async fn acquire(store: Store, strategy: &str, ttl_seconds: u64) -> Result<Option<Self>, cache_store::StoreError> {
        let key = keys::lock(strategy);
        let token = uuid::Uuid::new_v4().to_string();
        let acquired = store.set_nx(&key, token.as_bytes(), ttl_seconds).await?;
        if !acquired {
            return Ok(None);
        }

        let lost = Arc::new(AtomicBool::new(false));
        let refresh_task = spawn_refresh_task(store.clone(), key.clone(), token.clone(), ttl_seconds, lost.clone());

        Ok(Some(Self {
            strategy: strategy.to_string(),
            store,
            token,
            lost,
            refresh_task,
        }))
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Relaxed)
    }

    /// Releases the lock only if it still holds the token it acquired with. If the TTL
    /// lapsed mid-run and a new holder has since acquired the key, this leaves that
    /// holder's lock untouched instead of deleting it.
    pub async fn release(self) -> Result<(), cache_store::StoreError> {
        self.refresh_task.abort();
        let key = keys::lock(&self.strategy);
        let deleted = self.store.delete_if_matches(&key, self.token.as_bytes()).await?;
        if !deleted {
            tracing::warn!("strategy lock for {} was held by a newer holder at release, leaving it in place", self.strategy);
        }
        Ok(())
    }
}

fn spawn_refresh_task(
    store: Store,
    key: String,
    token: String,
    ttl_seconds: u64,
    lost: Arc<AtomicBool>,
) -> JoinHandle<()> {
    let refresh_interval = Duration::from_secs((ttl_seconds / 3).max(1));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(refresh_interval).await;
            match store.set(&key, token.as_bytes(), ttl_seconds).await {
                Ok(()) => {}
                Err(e) => {
                    tracing::error!("strategy lock refresh failed, abandoning lock: {e}");
                    lost.store(true, Ordering::Relaxed);
                    return;
                }
            }
        }
    })
}

impl Drop for StrategyLock {
    fn drop(&mut self) {
        self.refresh_task.abort();
    }
}
