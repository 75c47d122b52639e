use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant as StdInstant;

use cache_store::{keys, Store};
use chrono::Utc;
use discovery_core::{sort_candidates, Candidate, ClassificationThresholds, DiscoveryResult, ENGINE_VERSION, SCHEMA_VERSION};
use market_data_client::MarketDataSource;
use scorer::{RelVolBaseline, Scorer, ScorerConfig};
use tokio::sync::Semaphore;
use universe_loader::{SnapshotFilter, SnapshotFilterConfig, UniverseLoader, UniverseLoaderConfig};

use crate::error::CoordinatorError;
use crate::lock::StrategyLock;
use crate::progress::{NullProgressSink, ProgressSink, ProgressUpdate};

const CHUNK_SIZE: usize = 100;

pub struct CoordinatorConfig {
    pub price_min: f64,
    pub price_max: f64,
    pub min_dollar_vol_m: f64,
    pub universe_min_expected: usize,
    pub universe_k: usize,
    pub concurrency: usize,
    pub rvol_window_min: i64,
    pub rvol_threshold: f64,
    pub classification: ClassificationThresholds,
    pub cache_ttl_seconds: u64,
    pub lock_ttl_seconds: u64,
    pub early_stop_scan: usize,
    pub target_trade_ready: usize,
}

/// Drives one end-to-end `DiscoveryResult`: lock, universe, snapshot, scoring fan-out,
/// progressive status, early-stop, ranking, and the cache write that releases the run to
/// readers.
pub struct PipelineCoordinator {
    source: Arc<dyn MarketDataSource>,
    store: Store,
    baseline: Arc<dyn RelVolBaseline>,
    config: CoordinatorConfig,
}

impl PipelineCoordinator {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        store: Store,
        baseline: Arc<dyn RelVolBaseline>,
        config: CoordinatorConfig,
    ) -> Self {
        Self { source, store, baseline, config }
    }

    pub async fn run(
        &self,
        strategy: &str,
        limit: usize,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<DiscoveryResult, CoordinatorError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let mut stage_timings_ms = HashMap::new();

        let Some(lock) = StrategyLock::acquire(self.store.clone(), strategy, self.config.lock_ttl_seconds).await?
        else {
            return Err(CoordinatorError::LockHeld(strategy.to_string()));
        };

        let result = self.run_locked(&run_id, started_at, strategy, limit, &progress, &mut stage_timings_ms, &lock).await;

        lock.release().await?;
        result
    }

    async fn run_locked(
        &self,
        run_id: &str,
        started_at: chrono::DateTime<Utc>,
        strategy: &str,
        limit: usize,
        progress: &Arc<dyn ProgressSink>,
        stage_timings_ms: &mut HashMap<String, u64>,
        lock: &StrategyLock,
    ) -> Result<DiscoveryResult, CoordinatorError> {
        let t_universe = StdInstant::now();
        let universe_loader = UniverseLoader::new(
            self.source.clone(),
            UniverseLoaderConfig {
                price_min: self.config.price_min,
                price_max: self.config.price_max,
                min_dollar_vol_m: self.config.min_dollar_vol_m,
                universe_min_expected: self.config.universe_min_expected,
            },
        );
        let (universe, _universe_stats) = universe_loader.load().await?;
        stage_timings_ms.insert("universe".to_string(), t_universe.elapsed().as_millis() as u64);

        let t_snapshot = StdInstant::now();
        let snapshot_filter = SnapshotFilter::new(
            self.source.clone(),
            SnapshotFilterConfig {
                price_min: self.config.price_min,
                price_max: self.config.price_max,
                min_dollar_vol_m: self.config.min_dollar_vol_m,
                universe_k: self.config.universe_k,
            },
        );
        let snapshots = snapshot_filter.apply(&universe).await?;
        stage_timings_ms.insert("snapshot".to_string(), t_snapshot.elapsed().as_millis() as u64);

        let raw_bars_by_symbol: HashMap<_, _> = universe
            .iter()
            .map(|entry| (entry.symbol.clone(), entry.clone()))
            .collect();

        let scorer = Arc::new(Scorer::new(
            self.source.clone(),
            ScorerConfig {
                price_max: self.config.price_max,
                rvol_window_min: self.config.rvol_window_min,
                rvol_threshold: self.config.rvol_threshold,
                classification: self.config.classification,
            },
            self.baseline.clone(),
        ));

        let t_scoring = StdInstant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut scanned = 0usize;

        for chunk in snapshots.chunks(CHUNK_SIZE) {
            if lock.is_lost() {
                return Err(CoordinatorError::LockLost(strategy.to_string()));
            }

            let mut tasks = Vec::with_capacity(chunk.len());
            for snapshot in chunk.iter().cloned() {
                let Some(entry) = raw_bars_by_symbol.get(&snapshot.symbol) else {
                    continue;
                };
                let raw_bar = discovery_core::RawBar {
                    symbol: entry.symbol.clone(),
                    date: chrono::Utc::now().date_naive(),
                    open: entry.price,
                    high: entry.price,
                    low: entry.price,
                    close: entry.price,
                    volume: entry.volume,
                    vwap: None,
                    prev_close: snapshot.prev_close,
                };
                let scorer = scorer.clone();
                let semaphore = semaphore.clone();
                tasks.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    scorer.score_one(&raw_bar, &snapshot).await
                }));
            }

            for task in tasks {
                scanned += 1;
                match task.await {
                    Ok(Ok(Some(candidate))) => candidates.push(candidate),
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => tracing::warn!("symbol scoring failed, counted and continuing: {e}"),
                    Err(e) => tracing::warn!("scoring task panicked: {e}"),
                }
            }

            let trade_ready = candidates
                .iter()
                .filter(|c| matches!(c.classification, discovery_core::Classification::TradeReady))
                .count();

            progress.report(ProgressUpdate {
                progress_pct: ((scanned as f64 / snapshots.len().max(1) as f64) * 100.0) as u8,
                stage_label: "scoring".to_string(),
                scanned_so_far: scanned,
                trade_ready_so_far: trade_ready,
            });

            if scanned >= self.config.early_stop_scan && trade_ready >= self.config.target_trade_ready {
                tracing::info!("early stop: scanned {scanned}, trade_ready {trade_ready}");
                break;
            }
        }
        stage_timings_ms.insert("scoring".to_string(), t_scoring.elapsed().as_millis() as u64);

        sort_candidates(&mut candidates);
        candidates.truncate(limit);

        let finished_at = Utc::now();
        let result = DiscoveryResult {
            run_id: run_id.to_string(),
            started_at,
            finished_at,
            strategy_tag: strategy.to_string(),
            universe_count: universe.len(),
            prefilter_count: universe.len(),
            snapshot_count: snapshots.len(),
            scored_count: scanned,
            candidates,
            stage_timings_ms: stage_timings_ms.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
        };

        self.store
            .set_json(&keys::contenders(strategy), &result, self.config.cache_ttl_seconds)
            .await?;
        self.store
            .set_json(&keys::contenders_last(strategy), &result, 24 * 3600)
            .await?;

        Ok(result)
    }
}

pub fn null_progress_sink() -> Arc<dyn ProgressSink> {
    Arc::new(NullProgressSink)
}
