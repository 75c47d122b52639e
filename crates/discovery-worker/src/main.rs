use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cache_store::Store;
use discovery_core::DiscoveryConfig;
use job_queue::JobQueue;
use market_data_client::UpstreamClient;
use pipeline_coordinator::{CoordinatorConfig, PipelineCoordinator};
use scorer::{HistoricalAverageBaseline, SessionFractionHeuristic, RelVolBaseline};
use tokio::signal::unix::SignalKind;

mod heartbeat;
mod status_sink;

use status_sink::JobQueueProgressSink;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("worker panic: {info}");
    }));

    tracing::info!("starting discovery worker");

    let config = DiscoveryConfig::from_env().context("loading configuration")?;

    let store = Store::connect(&config.store_url)
        .await
        .context("connecting to cache store on boot")?;
    store.exists("boot-check").await.context("store connectivity check failed")?;

    let source: Arc<UpstreamClient> = Arc::new(UpstreamClient::new(
        config.upstream_api_key.clone(),
        config.rate_per_sec,
        config.rate_capacity,
        config.concurrency,
    ));

    let queue = Arc::new(JobQueue::new(store.clone()).with_result_ttl(config.result_ttl_seconds));

    let baseline: Arc<dyn RelVolBaseline> = Arc::new(fallback_baseline_chain());

    let coordinator = Arc::new(PipelineCoordinator::new(
        source.clone(),
        store.clone(),
        baseline,
        CoordinatorConfig {
            price_min: config.price_min,
            price_max: config.price_max,
            min_dollar_vol_m: config.min_dollar_vol_m,
            universe_min_expected: config.universe_min_expected,
            universe_k: config.universe_k,
            concurrency: config.concurrency,
            rvol_window_min: config.rvol_window_min,
            rvol_threshold: config.rvol_threshold,
            classification: config.classification,
            cache_ttl_seconds: config.cache_ttl_seconds,
            lock_ttl_seconds: config.job_timeout_seconds + 60,
            early_stop_scan: config.early_stop_scan,
            target_trade_ready: config.target_trade_ready,
        },
    ));

    let worker_id = uuid_like_worker_id();
    let _heartbeat_task = heartbeat::spawn(store.clone(), worker_id).await;

    let draining = Arc::new(AtomicBool::new(false));
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    let shutdown_flag = draining.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT, draining"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, draining"),
        }
        shutdown_flag.store(true, Ordering::Relaxed);
    });

    loop {
        if draining.load(Ordering::Relaxed) {
            tracing::info!("draining complete, exiting");
            break;
        }

        let job_record = match queue.poll_ready(&["discovery"]).await {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("poll_ready failed: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let job_id = job_record.job_id.clone();
        let strategy = job_record.strategy.clone();

        if let Err(e) = queue.mark_running(&job_id).await {
            tracing::error!("failed to mark job {job_id} running: {e}");
            continue;
        }

        let coordinator = coordinator.clone();
        let queue_for_task = queue.clone();
        let timeout = Duration::from_secs(config.job_timeout_seconds);

        let run = async move {
            let progress = Arc::new(JobQueueProgressSink::new(queue_for_task.clone(), job_id.clone()));
            let outcome = tokio::time::timeout(timeout, coordinator.run(&strategy, 25, progress)).await;

            match outcome {
                Ok(Ok(result)) => {
                    if let Err(e) = queue_for_task
                        .mark_finished(&job_id, format!("discovery:contenders:{strategy}"))
                        .await
                    {
                        tracing::error!("failed to mark job {job_id} finished: {e}");
                    }
                    tracing::info!("job {job_id} finished with {} candidates", result.candidates.len());
                }
                Ok(Err(e)) => {
                    tracing::error!("job {job_id} failed: {e}");
                    let _ = queue_for_task.mark_failed(&job_id, e.kind().as_str(), e.to_string()).await;
                }
                Err(_) => {
                    tracing::error!("job {job_id} timed out after {:?}", timeout);
                    let _ = queue_for_task.mark_failed(&job_id, "JobTimeout", "job exceeded its timeout").await;
                }
            }
        };

        if let Err(join_err) = tokio::spawn(run).await {
            tracing::error!("job execution task panicked: {join_err}");
            let _ = queue.mark_failed(&job_record.job_id, "Panic", join_err.to_string()).await;
        }
    }

    Ok(())
}

/// Combines the historical-average baseline with the hour-of-day heuristic as its
/// fallback: the heuristic only ever kicks in when history is unavailable.
fn fallback_baseline_chain() -> impl RelVolBaseline {
    ChainedBaseline {
        primary: HistoricalAverageBaseline,
        fallback: SessionFractionHeuristic::new(1_000_000.0),
    }
}

struct ChainedBaseline {
    primary: HistoricalAverageBaseline,
    fallback: SessionFractionHeuristic,
}

impl RelVolBaseline for ChainedBaseline {
    fn baseline(&self, symbol: &discovery_core::Symbol, historical_avg_volume: Option<f64>, now: chrono::DateTime<chrono::Utc>) -> f64 {
        if historical_avg_volume.is_some() {
            self.primary.baseline(symbol, historical_avg_volume, now)
        } else {
            self.fallback.baseline(symbol, historical_avg_volume, now)
        }
    }
}

fn uuid_like_worker_id() -> String {
    format!("worker-{}", std::process::id())
}
