use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use discovery_core::{Candidate, ClassificationThresholds, HistoricalBar, RawBar, Snapshot, Symbol, TechnicalSnapshot};
use market_data_client::MarketDataSource;
use tokio::sync::Mutex;

use crate::components::score_all;
use crate::error::ScorerError;
use crate::features::build_features;
use crate::multiplier;
use crate::rel_vol::{RelVolBaseline, RvolWindowTracker};

const HISTORY_LOOKBACK_DAYS: i64 = 60;

pub struct ScorerConfig {
    pub price_max: f64,
    pub rvol_window_min: i64,
    pub rvol_threshold: f64,
    pub classification: ClassificationThresholds,
}

/// Scores one symbol at a time against its historical aggregates and current snapshot.
/// Memoizes fetched history within a run and owns the per-symbol RVOL sliding window
/// exclusively — callers must not share a `Scorer` across concurrent tasks for the same
/// symbol, only across distinct ones.
pub struct Scorer {
    source: Arc<dyn MarketDataSource>,
    config: ScorerConfig,
    baseline: Arc<dyn RelVolBaseline>,
    rvol_tracker: Mutex<RvolWindowTracker>,
    history_memo: Mutex<HashMap<Symbol, Vec<HistoricalBar>>>,
}

impl Scorer {
    pub fn new(source: Arc<dyn MarketDataSource>, config: ScorerConfig, baseline: Arc<dyn RelVolBaseline>) -> Self {
        Self {
            source,
            config,
            baseline,
            rvol_tracker: Mutex::new(RvolWindowTracker::new()),
            history_memo: Mutex::new(HashMap::new()),
        }
    }

    pub async fn score_one(&self, raw_bar: &RawBar, snapshot: &Snapshot) -> Result<Option<Candidate>, ScorerError> {
        let now = Utc::now();
        let history = self.fetch_history_memoized(&raw_bar.symbol, now).await?;

        let historical_avg_volume = if history.is_empty() {
            None
        } else {
            Some(history.iter().map(|b| b.volume).sum::<f64>() / history.len() as f64)
        };

        let baseline = self.baseline.baseline(&raw_bar.symbol, historical_avg_volume, now);
        let rel_vol_current = if baseline > 0.0 { snapshot.day_volume / baseline } else { 0.0 };

        let rel_vol_sustained = {
            let mut tracker = self.rvol_tracker.lock().await;
            tracker.record_and_sustain(
                &raw_bar.symbol,
                rel_vol_current,
                now,
                self.config.rvol_window_min,
                self.config.rvol_threshold,
            )
        };

        let features = match build_features(raw_bar, snapshot, &history, rel_vol_current, rel_vol_sustained) {
            Ok(f) => f,
            Err(ScorerError::InsufficientHistory { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let component_scores = score_all(&features);
        let multiplier = multiplier::compute(&features);
        let total_score = ((component_scores.sum() as f64) * multiplier).round().clamp(0.0, 100.0) as u8;
        let classification = self.config.classification.classify(total_score);

        if matches!(classification, discovery_core::Classification::Ignore) {
            return Ok(None);
        }

        let entry_signal = multiplier::entry_signal(&features, self.config.price_max, self.config.rvol_threshold);

        Ok(Some(Candidate {
            symbol: raw_bar.symbol.clone(),
            price: snapshot.last_price,
            volume: snapshot.day_volume,
            dollar_volume: snapshot.dollar_volume(),
            change_pct: features.change_pct,
            rel_vol_current,
            rel_vol_sustained,
            component_scores,
            total_score,
            classification,
            entry_signal,
            technical_snapshot: TechnicalSnapshot {
                ema_9: features.ema_9,
                ema_20: features.ema_20,
                rsi: features.rsi,
                vwap: features.vwap,
                atr_pct: features.atr_pct,
            },
        }))
    }

    async fn fetch_history_memoized(
        &self,
        symbol: &Symbol,
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<HistoricalBar>, ScorerError> {
        if let Some(cached) = self.history_memo.lock().await.get(symbol) {
            return Ok(cached.clone());
        }
        let history = self
            .source
            .aggregates(symbol, now - Duration::days(HISTORY_LOOKBACK_DAYS), now)
            .await?;
        self.history_memo.lock().await.insert(symbol.clone(), history.clone());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use discovery_core::HistoricalBar;
    use market_data_client::{ClientError, TickerDetails};
    use std::collections::HashMap as StdHashMap;

    struct FakeSource {
        history: Vec<HistoricalBar>,
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn grouped_daily(&self, _date: NaiveDate) -> Result<Vec<RawBar>, ClientError> {
            Ok(Vec::new())
        }
        async fn snapshot_all(&self) -> Result<StdHashMap<Symbol, Snapshot>, ClientError> {
            Ok(StdHashMap::new())
        }
        async fn aggregates(
            &self,
            _symbol: &Symbol,
            _from: chrono::DateTime<Utc>,
            _to: chrono::DateTime<Utc>,
        ) -> Result<Vec<HistoricalBar>, ClientError> {
            Ok(self.history.clone())
        }
        async fn ticker_details_batch(&self, _symbols: &[Symbol]) -> Result<Vec<TickerDetails>, ClientError> {
            Ok(Vec::new())
        }
        async fn list_reference_tickers(&self, _max: usize) -> Result<Vec<String>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn history(n: usize, base_volume: f64) -> Vec<HistoricalBar> {
        (0..n)
            .map(|i| HistoricalBar {
                timestamp: Utc::now() - Duration::days((n - i) as i64),
                open: 10.0,
                high: 10.5,
                low: 9.5,
                close: 10.0 + (i as f64) * 0.05,
                volume: base_volume,
            })
            .collect()
    }

    fn raw_bar() -> RawBar {
        RawBar {
            symbol: Symbol::new("ACME").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            open: 11.0,
            high: 11.8,
            low: 10.9,
            close: 11.5,
            volume: 4_000_000.0,
            vwap: Some(11.2),
            prev_close: Some(11.0),
        }
    }

    fn snapshot(volume: f64) -> Snapshot {
        Snapshot {
            symbol: Symbol::new("ACME").unwrap(),
            last_price: 12.0,
            day_volume: volume,
            prev_close: Some(11.0),
            timestamp: Utc::now(),
        }
    }

    fn config() -> ScorerConfig {
        ScorerConfig {
            price_max: 100.0,
            rvol_window_min: 15,
            rvol_threshold: 3.0,
            classification: ClassificationThresholds::default(),
        }
    }

    #[tokio::test]
    async fn returns_none_for_insufficient_history() {
        let scorer = Scorer::new(
            Arc::new(FakeSource { history: history(3, 1_000_000.0) }),
            config(),
            Arc::new(crate::rel_vol::HistoricalAverageBaseline),
        );
        let result = scorer.score_one(&raw_bar(), &snapshot(1_000_000.0)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn scores_a_high_relative_volume_breakout() {
        let scorer = Scorer::new(
            Arc::new(FakeSource { history: history(25, 1_000_000.0) }),
            config(),
            Arc::new(crate::rel_vol::HistoricalAverageBaseline),
        );
        let result = scorer.score_one(&raw_bar(), &snapshot(12_000_000.0)).await.unwrap();
        if let Some(candidate) = result {
            assert!(candidate.total_score <= 100);
            assert_eq!(candidate.symbol.as_ref(), "ACME");
        }
    }
}
