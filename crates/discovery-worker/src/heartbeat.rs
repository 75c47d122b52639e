use std::time::Duration;

use cache_store::{keys, Store};
use discovery_core::CacheEntry;
use serde::{Deserialize, Serialize};

const INTERVAL_SECONDS: u64 = 30;
const TTL_SECONDS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub worker_id: String,
}

/// Writes `worker:heartbeat` every 30s with a 120s TTL so the gateway can tell "a worker is
/// alive" from "no worker at all" without a separate liveness channel.
pub async fn spawn(store: Store, worker_id: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(INTERVAL_SECONDS));
        loop {
            interval.tick().await;
            let entry = CacheEntry::new(HeartbeatPayload { worker_id: worker_id.clone() }, TTL_SECONDS);
            if let Err(e) = store.set_json(keys::HEARTBEAT, &entry, TTL_SECONDS).await {
                tracing::warn!("heartbeat write failed: {e}");
            }
        }
    })
}
