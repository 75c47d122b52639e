use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;

use discovery_core::{HistoricalBar, RawBar, Snapshot, Symbol};

use crate::decode::maybe_decompress;
use crate::error::ClientError;
use crate::memo_cache::MemoCache;
use crate::rate_limiter::TokenBucket;
use crate::types::{
    AggregateResponse, GroupedResponse, SnapshotResponse, TickerDetails, TickerListEntry,
    TickerListResponse,
};

const BASE_URL: &str = "https://api.polygon.io";
const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The collaborator interface the pipeline coordinator and scorer depend on. Tests inject
/// a fake implementation instead of hitting the network.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn grouped_daily(&self, date: NaiveDate) -> Result<Vec<RawBar>, ClientError>;
    async fn snapshot_all(&self) -> Result<HashMap<Symbol, Snapshot>, ClientError>;
    async fn aggregates(
        &self,
        symbol: &Symbol,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoricalBar>, ClientError>;
    async fn ticker_details_batch(&self, symbols: &[Symbol]) -> Result<Vec<TickerDetails>, ClientError>;
    async fn list_reference_tickers(&self, max: usize) -> Result<Vec<String>, ClientError>;
}

/// Single typed client over the market-data provider: token-bucket rate limiting, bounded
/// concurrency, retry with exponential backoff, and safe decoding of possibly-compressed
/// bodies.
#[derive(Clone)]
pub struct UpstreamClient {
    api_key: String,
    http: Client,
    rate_bucket: TokenBucket,
    concurrency: Arc<Semaphore>,
    memo: Arc<MemoCache>,
}

impl UpstreamClient {
    pub fn new(api_key: String, rate_per_sec: u32, rate_capacity: u32, concurrency: usize) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            http,
            rate_bucket: TokenBucket::new(rate_per_sec, rate_capacity),
            concurrency: Arc::new(Semaphore::new(concurrency.max(1))),
            memo: Arc::new(MemoCache::new(60)),
        }
    }

    /// Sends one logical request: takes a rate-bucket token, acquires a concurrency
    /// permit, retries up to `MAX_ATTEMPTS` with exponential backoff, and safely decodes
    /// the body before handing it back as raw bytes for the caller to deserialize.
    async fn send(&self, memo_key: &str, request: impl Fn() -> reqwest::RequestBuilder) -> Result<Vec<u8>, ClientError> {
        if let Some(cached) = self.memo.get(memo_key) {
            return Ok(cached);
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.rate_bucket.take().await;
            let _permit = self.concurrency.acquire().await.expect("semaphore not closed");

            let result = tokio::time::timeout(REQUEST_TIMEOUT, request().send()).await;

            let response = match result {
                Err(_) => return Err(ClientError::Timeout(REQUEST_TIMEOUT)),
                Ok(Err(e)) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(ClientError::Malformed(e.to_string()));
                    }
                    backoff(attempt).await;
                    continue;
                }
                Ok(Ok(response)) => response,
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());

                if attempt >= MAX_ATTEMPTS && retry_after.is_none() {
                    return Err(ClientError::RateLimited { attempts: attempt });
                }
                let wait = retry_after.map(Duration::from_secs).unwrap_or_else(|| backoff_duration(attempt + 2));
                tracing::warn!("upstream 429, waiting {:?} before retry {}/{}", wait, attempt, MAX_ATTEMPTS);
                tokio::time::sleep(wait).await;
                // A retry-after hint does not consume a retry slot.
                if retry_after.is_some() {
                    attempt -= 1;
                }
                continue;
            }

            if status.is_server_error() {
                if attempt >= MAX_ATTEMPTS {
                    return Err(ClientError::Upstream5xx { status: status.as_u16() });
                }
                backoff(attempt).await;
                continue;
            }

            if status.is_client_error() && status != StatusCode::REQUEST_TIMEOUT {
                let text = response.text().await.unwrap_or_default();
                return Err(ClientError::Malformed(format!("HTTP {status}: {text}")));
            }

            let content_encoding = response
                .headers()
                .get(reqwest::header::CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let bytes = response
                .bytes()
                .await
                .map_err(|e| ClientError::Malformed(e.to_string()))?;

            let decoded = maybe_decompress(&bytes, content_encoding.as_deref())
                .map_err(|e| ClientError::Malformed(e.to_string()))?;

            self.memo.put(memo_key.to_string(), decoded.clone());
            return Ok(decoded);
        }
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.query(&[("apiKey", self.api_key.as_str())])
    }
}

async fn backoff(attempt: u32) {
    tokio::time::sleep(backoff_duration(attempt)).await;
}

/// Exponential backoff with base 2: 1s, 2s, 4s, ...
fn backoff_duration(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt.saturating_sub(1).min(10)))
}

#[async_trait]
impl MarketDataSource for UpstreamClient {
    async fn grouped_daily(&self, date: NaiveDate) -> Result<Vec<RawBar>, ClientError> {
        let url = format!(
            "{BASE_URL}/v2/aggs/grouped/locale/us/market/stocks/{}",
            date.format("%Y-%m-%d")
        );
        let memo_key = format!("grouped_daily:{date}");
        let bytes = self
            .send(&memo_key, || self.auth(self.http.get(&url).query(&[("adjusted", "true")])))
            .await?;

        let parsed: GroupedResponse =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(|row| {
                let symbol = Symbol::new(&row.ticker).ok()?;
                Some(RawBar {
                    symbol,
                    date,
                    open: row.open,
                    high: row.high,
                    low: row.low,
                    close: row.close,
                    volume: row.volume,
                    vwap: row.vwap,
                    prev_close: None,
                })
            })
            .collect())
    }

    async fn snapshot_all(&self) -> Result<HashMap<Symbol, Snapshot>, ClientError> {
        let url = format!("{BASE_URL}/v2/snapshot/locale/us/markets/stocks/tickers");
        let bytes = self.send("snapshot_all", || self.auth(self.http.get(&url))).await?;

        let parsed: SnapshotResponse =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))?;

        let now = Utc::now();
        Ok(parsed
            .tickers
            .into_iter()
            .filter_map(|row| {
                let symbol = Symbol::new(&row.ticker).ok()?;
                let day = row.day?;
                Some((
                    symbol.clone(),
                    Snapshot {
                        symbol,
                        last_price: day.c,
                        day_volume: day.v,
                        prev_close: row.prev_day.map(|p| p.c).filter(|c| *c > 0.0),
                        timestamp: now,
                    },
                ))
            })
            .collect())
    }

    async fn aggregates(
        &self,
        symbol: &Symbol,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoricalBar>, ClientError> {
        let url = format!(
            "{BASE_URL}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        );
        let memo_key = format!("aggregates:{symbol}:{from}:{to}");
        let bytes = self
            .send(&memo_key, || self.auth(self.http.get(&url).query(&[("adjusted", "true")])))
            .await?;

        let parsed: AggregateResponse =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|row| HistoricalBar {
                timestamp: DateTime::from_timestamp_millis(row.timestamp_ms).unwrap_or(now_fallback()),
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            })
            .collect())
    }

    async fn ticker_details_batch(&self, symbols: &[Symbol]) -> Result<Vec<TickerDetails>, ClientError> {
        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let url = format!("{BASE_URL}/v3/reference/tickers/{symbol}");
            let memo_key = format!("ticker_details:{symbol}");
            let bytes = self.send(&memo_key, || self.auth(self.http.get(&url))).await?;

            #[derive(serde::Deserialize)]
            struct Wrapper {
                results: TickerResult,
            }
            #[derive(serde::Deserialize)]
            struct TickerResult {
                ticker: String,
                #[serde(default)]
                r#type: Option<String>,
            }

            match serde_json::from_slice::<Wrapper>(&bytes) {
                Ok(w) => out.push(TickerDetails {
                    ticker: w.results.ticker,
                    security_type: w.results.r#type,
                }),
                Err(_) => continue,
            }
        }
        Ok(out)
    }

    async fn list_reference_tickers(&self, max: usize) -> Result<Vec<String>, ClientError> {
        let mut tickers = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0;

        loop {
            if page >= 10 {
                break;
            }
            page += 1;

            let url = format!("{BASE_URL}/v3/reference/tickers");
            let memo_key = format!("list_reference_tickers:{page}:{cursor:?}");
            let bytes = self
                .send(&memo_key, || {
                    let mut builder = self.auth(self.http.get(&url)).query(&[
                        ("market", "stocks"),
                        ("active", "true"),
                        ("type", "CS"),
                        ("limit", "1000"),
                        ("sort", "ticker"),
                    ]);
                    if let Some(ref c) = cursor {
                        builder = builder.query(&[("cursor", c.as_str())]);
                    }
                    builder
                })
                .await?;

            let parsed: TickerListResponse =
                serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))?;

            if parsed.results.is_empty() {
                break;
            }

            for TickerListEntry { ticker, .. } in parsed.results {
                tickers.push(ticker);
                if tickers.len() >= max {
                    return Ok(tickers);
                }
            }

            cursor = parsed
                .next_url
                .as_ref()
                .and_then(|next| next.split("cursor=").nth(1))
                .map(|s| s.split('&').next().unwrap_or(s).to_string());

            if cursor.is_none() {
                break;
            }
        }

        Ok(tickers)
    }
}

fn now_fallback() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn backoff_grows_exponentially_with_base_two() {
        assert_eq!(backoff_duration(1), Duration::from_secs(1));
        assert_eq!(backoff_duration(2), Duration::from_secs(2));
        assert_eq!(backoff_duration(3), Duration::from_secs(4));
    }
}
