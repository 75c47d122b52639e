use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// A token bucket: steady refill rate plus a burst capacity. Unlike a sliding-window
/// counter, refill is purely a function of elapsed wall-clock time since the last
/// refill, so contention among many waiting tasks never distorts the rate.
#[derive(Clone)]
pub struct TokenBucket {
    inner: Arc<Mutex<BucketState>>,
    rate_per_sec: f64,
    capacity: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rate_per_sec: u32, capacity: u32) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            inner: Arc::new(Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            })),
            rate_per_sec: rate_per_sec.max(1) as f64,
            capacity,
        }
    }

    /// Blocks cooperatively until a token is available, then consumes it.
    pub async fn take(&self) {
        loop {
            let wait = {
                let mut state = self.inner.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(std::time::Duration::from_secs_f64(deficit / self.rate_per_sec))
                }
            };

            match wait {
                None => return,
                Some(dur) => tokio::time::sleep(dur).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_up_to_capacity_is_immediate() {
        let bucket = TokenBucket::new(5, 5);
        let start = Instant::now();
        for _ in 0..5 {
            bucket.take().await;
        }
        assert!(start.elapsed() < std::time::Duration::from_millis(50));
    }

    #[tokio::test]
    async fn exceeding_capacity_blocks_for_refill() {
        let bucket = TokenBucket::new(20, 2);
        bucket.take().await;
        bucket.take().await;
        let start = Instant::now();
        bucket.take().await;
        // third token needed ~1/20s = 50ms of refill.
        assert!(start.elapsed() >= std::time::Duration::from_millis(30));
    }
}
