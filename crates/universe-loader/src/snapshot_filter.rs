use discovery_core::Snapshot;
use market_data_client::MarketDataSource;

use crate::error::UniverseError;
use crate::loader::UniverseEntry;

pub struct SnapshotFilterConfig {
    pub price_min: f64,
    pub price_max: f64,
    pub min_dollar_vol_m: f64,
    pub universe_k: usize,
}

/// Re-checks price and dollar-volume bounds against the current session's snapshot,
/// catching symbols whose pre-market activity has since moved them outside bounds, then
/// caps the survivor list while preserving the incoming order.
pub struct SnapshotFilter {
    source: std::sync::Arc<dyn MarketDataSource>,
    config: SnapshotFilterConfig,
}

impl SnapshotFilter {
    pub fn new(source: std::sync::Arc<dyn MarketDataSource>, config: SnapshotFilterConfig) -> Self {
        Self { source, config }
    }

    pub async fn apply(&self, entries: &[UniverseEntry]) -> Result<Vec<Snapshot>, UniverseError> {
        let snapshots = self.source.snapshot_all().await?;
        let floor = self.config.min_dollar_vol_m * 1_000_000.0;

        let mut out = Vec::new();
        for entry in entries {
            let Some(snapshot) = snapshots.get(&entry.symbol) else {
                continue;
            };
            if snapshot.last_price < self.config.price_min || snapshot.last_price > self.config.price_max {
                continue;
            }
            if snapshot.day_volume > 0.0 && snapshot.dollar_volume() < floor {
                continue;
            }
            out.push(snapshot.clone());
            if out.len() >= self.config.universe_k {
                break;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use discovery_core::{HistoricalBar, RawBar, Symbol};
    use market_data_client::{ClientError, TickerDetails};
    use std::collections::HashMap;

    struct FakeSource {
        snapshots: HashMap<Symbol, Snapshot>,
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn grouped_daily(&self, _date: NaiveDate) -> Result<Vec<RawBar>, ClientError> {
            Ok(Vec::new())
        }
        async fn snapshot_all(&self) -> Result<HashMap<Symbol, Snapshot>, ClientError> {
            Ok(self.snapshots.clone())
        }
        async fn aggregates(
            &self,
            _symbol: &Symbol,
            _from: chrono::DateTime<chrono::Utc>,
            _to: chrono::DateTime<chrono::Utc>,
        ) -> Result<Vec<HistoricalBar>, ClientError> {
            Ok(Vec::new())
        }
        async fn ticker_details_batch(&self, _symbols: &[Symbol]) -> Result<Vec<TickerDetails>, ClientError> {
            Ok(Vec::new())
        }
        async fn list_reference_tickers(&self, _max: usize) -> Result<Vec<String>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn snapshot(symbol: &str, price: f64, volume: f64) -> Snapshot {
        Snapshot {
            symbol: Symbol::new(symbol).unwrap(),
            last_price: price,
            day_volume: volume,
            prev_close: Some(price),
            timestamp: Utc::now(),
        }
    }

    fn cfg(k: usize) -> SnapshotFilterConfig {
        SnapshotFilterConfig {
            price_min: 0.50,
            price_max: 100.0,
            min_dollar_vol_m: 5.0,
            universe_k: k,
        }
    }

    #[tokio::test]
    async fn drops_symbols_outside_bounds_on_current_session() {
        let acme = Symbol::new("ACME").unwrap();
        let pricey = Symbol::new("PRICEY").unwrap();
        let entries = vec![
            UniverseEntry { symbol: acme.clone(), price: 10.0, volume: 1_000_000.0 },
            UniverseEntry { symbol: pricey.clone(), price: 10.0, volume: 1_000_000.0 },
        ];
        let mut snapshots = HashMap::new();
        snapshots.insert(acme, snapshot("ACME", 10.0, 1_000_000.0));
        snapshots.insert(pricey, snapshot("PRICEY", 150.0, 1_000_000.0));

        let filter = SnapshotFilter::new(std::sync::Arc::new(FakeSource { snapshots }), cfg(10));
        let out = filter.apply(&entries).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol.as_ref(), "ACME");
    }

    #[tokio::test]
    async fn caps_at_universe_k_preserving_order() {
        let mut entries = Vec::new();
        let mut snapshots = HashMap::new();
        for suffix in ["A", "B", "C", "D", "E"] {
            let sym = Symbol::new(&format!("SY{suffix}")).unwrap();
            entries.push(UniverseEntry { symbol: sym.clone(), price: 10.0, volume: 1_000_000.0 });
            snapshots.insert(sym.clone(), snapshot(sym.as_ref(), 10.0, 1_000_000.0));
        }

        let filter = SnapshotFilter::new(std::sync::Arc::new(FakeSource { snapshots }), cfg(3));
        let out = filter.apply(&entries).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].symbol.as_ref(), "SYA");
        assert_eq!(out[2].symbol.as_ref(), "SYC");
    }
}
