use anyhow::{Context, Result};
use discovery_core::DiscoveryConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("gateway panic: {info}");
    }));

    tracing::info!("starting discovery gateway");

    let config = DiscoveryConfig::from_env().context("loading configuration")?;
    discovery_gateway::run_server(config).await
}
