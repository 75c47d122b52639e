use std::collections::HashMap;

use chrono::NaiveDate;
use discovery_core::{RawBar, Symbol};
use market_data_client::MarketDataSource;

use crate::error::UniverseError;
use crate::filters::is_fund_like;
use crate::stats::UniverseStats;
use crate::trading_date::most_recent_trading_date;

#[derive(Debug, Clone)]
pub struct UniverseEntry {
    pub symbol: Symbol,
    pub price: f64,
    pub volume: f64,
}

pub struct UniverseLoaderConfig {
    pub price_min: f64,
    pub price_max: f64,
    pub min_dollar_vol_m: f64,
    pub universe_min_expected: usize,
}

/// Fetches the day's tradable universe and applies local price/fund/volume filters. Falls
/// back to the paged reference-ticker endpoint when the grouped feed looks too thin, and
/// fails the run outright if coverage still falls below the floor.
pub struct UniverseLoader {
    source: std::sync::Arc<dyn MarketDataSource>,
    config: UniverseLoaderConfig,
}

impl UniverseLoader {
    pub fn new(source: std::sync::Arc<dyn MarketDataSource>, config: UniverseLoaderConfig) -> Self {
        Self { source, config }
    }

    pub async fn load(&self) -> Result<(Vec<UniverseEntry>, UniverseStats), UniverseError> {
        self.load_for_date(most_recent_trading_date()).await
    }

    pub async fn load_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<(Vec<UniverseEntry>, UniverseStats), UniverseError> {
        let mut bars = self.source.grouped_daily(date).await?;

        if bars.len() < self.config.universe_min_expected {
            tracing::warn!(
                "grouped_daily returned {} rows, below floor {}; falling back to reference listing",
                bars.len(),
                self.config.universe_min_expected
            );
            let fallback = self.fetch_via_reference_listing().await?;
            if fallback.len() > bars.len() {
                bars = fallback;
            }
        }

        let total_fetched = bars.len();
        if total_fetched < self.config.universe_min_expected {
            return Err(UniverseError::CoverageFloor {
                actual: total_fetched,
                required: self.config.universe_min_expected,
            });
        }

        let mut stats = UniverseStats {
            total_fetched,
            ..Default::default()
        };

        let after_price: Vec<&RawBar> = bars
            .iter()
            .filter(|b| b.close >= self.config.price_min && b.close <= self.config.price_max)
            .collect();
        stats.after_price = after_price.len();

        let candidate_symbols: Vec<Symbol> = after_price.iter().map(|b| b.symbol.clone()).collect();
        let security_types = self.fetch_security_types(&candidate_symbols).await;

        let after_fund: Vec<&RawBar> = after_price
            .into_iter()
            .filter(|b| {
                let security_type = security_types.get(&b.symbol).and_then(|t| t.as_deref());
                !is_fund_like(b.symbol.as_ref(), None, security_type)
            })
            .collect();
        stats.after_fund = after_fund.len();

        let floor = self.config.min_dollar_vol_m * 1_000_000.0;
        let after_volume: Vec<&RawBar> = after_fund
            .into_iter()
            .filter(|b| b.volume <= 0.0 || b.dollar_volume() >= floor)
            .collect();
        stats.after_volume = after_volume.len();
        stats.final_count = after_volume.len();

        let entries = after_volume
            .into_iter()
            .map(|b| UniverseEntry {
                symbol: b.symbol.clone(),
                price: b.close,
                volume: b.volume,
            })
            .collect();

        Ok((entries, stats))
    }

    /// Looks up provider-supplied security type for each candidate so `is_fund_like` can
    /// catch funds the static symbol blocklist misses. Best-effort: a lookup failure just
    /// leaves that symbol without a security type rather than failing the whole run.
    async fn fetch_security_types(&self, symbols: &[Symbol]) -> HashMap<Symbol, Option<String>> {
        match self.source.ticker_details_batch(symbols).await {
            Ok(details) => details
                .into_iter()
                .filter_map(|d| Symbol::new(&d.ticker).ok().map(|s| (s, d.security_type)))
                .collect(),
            Err(e) => {
                tracing::warn!("ticker_details_batch failed, fund filter will rely on symbol blocklist only: {e}");
                HashMap::new()
            }
        }
    }

    async fn fetch_via_reference_listing(&self) -> Result<Vec<RawBar>, UniverseError> {
        let tickers = self
            .source
            .list_reference_tickers(self.config.universe_min_expected * 2)
            .await?;

        // The reference endpoint gives symbols, not OHLCV; synthesize placeholder bars
        // with no price so downstream filters exclude them until a later grouped fetch
        // succeeds. This path only ever widens coverage counting, never survives filtering.
        Ok(tickers
            .into_iter()
            .filter_map(|t| Symbol::new(&t).ok())
            .map(|symbol| RawBar {
                symbol,
                date: most_recent_trading_date(),
                open: 0.0,
                high: 0.0,
                low: 0.0,
                close: 0.0,
                volume: 0.0,
                vwap: None,
                prev_close: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use discovery_core::{HistoricalBar, Snapshot};
    use market_data_client::{ClientError, TickerDetails};
    use std::collections::HashMap;

    struct FakeSource {
        bars: Vec<RawBar>,
        security_types: HashMap<String, String>,
    }

    impl FakeSource {
        fn new(bars: Vec<RawBar>) -> Self {
            Self { bars, security_types: HashMap::new() }
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn grouped_daily(&self, _date: NaiveDate) -> Result<Vec<RawBar>, ClientError> {
            Ok(self.bars.clone())
        }
        async fn snapshot_all(&self) -> Result<HashMap<Symbol, Snapshot>, ClientError> {
            Ok(HashMap::new())
        }
        async fn aggregates(
            &self,
            _symbol: &Symbol,
            _from: chrono::DateTime<chrono::Utc>,
            _to: chrono::DateTime<chrono::Utc>,
        ) -> Result<Vec<HistoricalBar>, ClientError> {
            Ok(Vec::new())
        }
        async fn ticker_details_batch(&self, symbols: &[Symbol]) -> Result<Vec<TickerDetails>, ClientError> {
            Ok(symbols
                .iter()
                .filter_map(|s| {
                    self.security_types
                        .get(s.as_ref())
                        .map(|t| TickerDetails { ticker: s.as_ref().to_string(), security_type: Some(t.clone()) })
                })
                .collect())
        }
        async fn list_reference_tickers(&self, _max: usize) -> Result<Vec<String>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn bar(symbol: &str, close: f64, volume: f64) -> RawBar {
        RawBar {
            symbol: Symbol::new(symbol).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
            vwap: None,
            prev_close: None,
        }
    }

    fn cfg() -> UniverseLoaderConfig {
        UniverseLoaderConfig {
            price_min: 0.50,
            price_max: 100.0,
            min_dollar_vol_m: 5.0,
            universe_min_expected: 2,
        }
    }

    #[tokio::test]
    async fn filters_price_fund_and_volume() {
        let bars = vec![
            bar("ACME", 10.0, 1_000_000.0),
            bar("TQQQ", 10.0, 1_000_000.0),
            bar("PENNY", 0.10, 1_000_000.0),
            bar("THIN", 10.0, 10.0),
        ];
        let source = std::sync::Arc::new(FakeSource::new(bars));
        let loader = UniverseLoader::new(source, cfg());
        let (entries, stats) = loader.load_for_date(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol.as_ref(), "ACME");
        assert_eq!(stats.total_fetched, 4);
        assert_eq!(stats.after_price, 3);
        assert_eq!(stats.after_fund, 2);
        assert_eq!(stats.final_count, 1);
    }

    #[tokio::test]
    async fn breaches_coverage_floor_when_universe_too_thin() {
        let bars = vec![bar("ACME", 10.0, 1_000_000.0)];
        let source = std::sync::Arc::new(FakeSource::new(bars));
        let mut config = cfg();
        config.universe_min_expected = 5;
        let loader = UniverseLoader::new(source, config);
        let err = loader
            .load_for_date(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, UniverseError::CoverageFloor { .. }));
    }

    #[tokio::test]
    async fn provider_security_type_catches_fund_the_symbol_blocklist_misses() {
        let bars = vec![bar("ACME", 10.0, 1_000_000.0), bar("RWJ", 10.0, 1_000_000.0)];
        let mut source = FakeSource::new(bars);
        source.security_types.insert("RWJ".to_string(), "ETF".to_string());
        let loader = UniverseLoader::new(std::sync::Arc::new(source), cfg());

        let (entries, stats) = loader.load_for_date(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol.as_ref(), "ACME");
        assert_eq!(stats.after_fund, 1);
    }
}
