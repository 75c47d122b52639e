use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Async key-value store over a single Redis-compatible backend. `ConnectionManager`
/// already reconnects transparently; this wrapper adds one explicit retry per call so a
/// connection lost mid-request surfaces as a successful retry rather than a hard failure,
/// without ever falling back to a blocking client for the same backend.
#[derive(Clone)]
pub struct Store {
    manager: ConnectionManager,
}

impl Store {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { manager })
    }

    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: Fn(ConnectionManager) -> Fut,
        Fut: std::future::Future<Output = redis::RedisResult<T>>,
    {
        match op(self.manager.clone()).await {
            Ok(value) => Ok(value),
            Err(first_err) => {
                tracing::warn!("store call failed, retrying once: {first_err}");
                op(self.manager.clone()).await.map_err(|e| StoreError::Unavailable(e.to_string()))
            }
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = key.to_string();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            async move { conn.get::<_, Option<Vec<u8>>>(key).await }
        })
        .await
    }

    pub async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_vec();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            let value = value.clone();
            async move {
                if ttl_seconds > 0 {
                    conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await
                } else {
                    conn.set::<_, _, ()>(key, value).await
                }
            }
        })
        .await
    }

    pub async fn del(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            async move { conn.del::<_, ()>(key).await }
        })
        .await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let key = key.to_string();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            async move { conn.exists::<_, bool>(key).await }
        })
        .await
    }

    pub async fn ttl(&self, key: &str) -> Result<i64, StoreError> {
        let key = key.to_string();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            async move { conn.ttl::<_, i64>(key).await }
        })
        .await
    }

    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let pattern = pattern.to_string();
        self.with_retry(move |mut conn| {
            let pattern = pattern.clone();
            async move { conn.keys::<_, Vec<String>>(pattern).await }
        })
        .await
    }

    pub async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let key = key.to_string();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            async move { conn.incr::<_, _, i64>(key, 1).await }
        })
        .await
    }

    /// Atomic set-if-absent, used for lock acquisition: succeeds only if `key` did not
    /// already exist.
    pub async fn set_nx(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<bool, StoreError> {
        let key = key.to_string();
        let value = value.to_vec();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            let value = value.clone();
            async move {
                redis::cmd("SET")
                    .arg(&key)
                    .arg(&value)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_seconds)
                    .query_async::<Option<String>>(&mut conn)
                    .await
                    .map(|r| r.is_some())
            }
        })
        .await
    }

    /// Deletes `key` only if its current value equals `expected`, so a holder that lost a
    /// lock's TTL race never clobbers whatever a newer holder has since written. Returns
    /// true if the delete happened.
    pub async fn delete_if_matches(&self, key: &str, expected: &[u8]) -> Result<bool, StoreError> {
        const SCRIPT: &str = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#;
        let key = key.to_string();
        let expected = expected.to_vec();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            let expected = expected.clone();
            async move {
                redis::Script::new(SCRIPT)
                    .key(key)
                    .arg(expected)
                    .invoke_async::<i64>(&mut conn)
                    .await
                    .map(|deleted| deleted == 1)
            }
        })
        .await
    }

    pub async fn rpush(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_vec();
        self.with_retry(move |mut conn| {
            let key = key.clone();
            let value = value.clone();
            async move { conn.rpush::<_, _, ()>(key, value).await }
        })
        .await
    }

    /// Blocks cooperatively (bounded by `timeout_seconds`) for the next item at the head of
    /// any of `keys`, FIFO per key. Returns `None` on timeout rather than erroring, so a
    /// caller can loop and re-check shutdown state between polls.
    pub async fn blpop(&self, keys: &[String], timeout_seconds: f64) -> Result<Option<(String, Vec<u8>)>, StoreError> {
        let keys = keys.to_vec();
        self.with_retry(move |mut conn| {
            let keys = keys.clone();
            async move {
                let result: Option<(String, Vec<u8>)> = conn.blpop(keys, timeout_seconds).await?;
                Ok(result)
            }
        })
        .await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, &bytes, ttl_seconds).await
    }
}
