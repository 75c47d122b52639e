mod request_id;
mod response;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use cache_store::Store;
use discovery_core::DiscoveryConfig;
use job_queue::JobQueue;
use market_data_client::UpstreamClient;
use pipeline_coordinator::{CoordinatorConfig, PipelineCoordinator};
use scorer::{HistoricalAverageBaseline, RelVolBaseline};
use tower_http::trace::TraceLayer;

pub use response::{ApiResponse, AppError};
pub use state::AppState;

/// Builds the shared state and axum router, then serves on `config.bind_addr` until the
/// process receives a shutdown signal. Mirrors the worker's boot sequence: validate
/// configuration, prove store connectivity, then start accepting traffic.
pub async fn run_server(config: DiscoveryConfig) -> Result<()> {
    let store = Store::connect(&config.store_url).await.context("connecting to cache store on boot")?;
    store.exists("boot-check").await.context("store connectivity check failed")?;

    let source: Arc<UpstreamClient> = Arc::new(UpstreamClient::new(
        config.upstream_api_key.clone(),
        config.rate_per_sec,
        config.rate_capacity,
        config.concurrency,
    ));

    let queue = Arc::new(JobQueue::new(store.clone()).with_result_ttl(config.result_ttl_seconds));

    let baseline: Arc<dyn RelVolBaseline> = Arc::new(HistoricalAverageBaseline);
    let coordinator = Arc::new(PipelineCoordinator::new(
        source,
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

    let bind_addr = config.bind_addr.clone();
    let state = AppState { store, queue, coordinator, config: Arc::new(config) };

    let app = routes::router(state)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.context("binding gateway listener")?;
    tracing::info!("discovery gateway listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server loop failed")
}

async fn shutdown_signal() {
    let ctrl_c = async { tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler") };
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
