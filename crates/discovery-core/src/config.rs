use crate::scores::ClassificationThresholds;

/// Process-wide configuration, loaded once at boot from the environment. Required keys
/// missing is a fatal `ConfigError`, raised before any task spawns — never a lazily
/// discovered panic mid-run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub upstream_api_key: String,
    pub store_url: String,

    pub price_min: f64,
    pub price_max: f64,
    pub min_dollar_vol_m: f64,
    pub universe_min_expected: usize,
    pub universe_k: usize,

    pub concurrency: usize,
    pub rate_per_sec: u32,
    pub rate_capacity: u32,

    pub rvol_window_min: i64,
    pub rvol_threshold: f64,

    pub classification: ClassificationThresholds,

    pub cache_ttl_seconds: u64,
    pub job_timeout_seconds: u64,
    pub result_ttl_seconds: u64,

    pub early_stop_scan: usize,
    pub target_trade_ready: usize,

    pub bind_addr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingRequired(&'static str),
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_var(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl DiscoveryConfig {
    /// Loads configuration from the process environment, calling `dotenvy::dotenv()` first
    /// so a local `.env` file is picked up the same way the rest of the workspace does it.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let upstream_api_key =
            env_var("UPSTREAM_API_KEY").ok_or(ConfigError::MissingRequired("UPSTREAM_API_KEY"))?;
        let store_url = env_var("STORE_URL").ok_or(ConfigError::MissingRequired("STORE_URL"))?;

        Ok(Self {
            upstream_api_key,
            store_url,
            price_min: env_parse("PRICE_MIN", 0.50),
            price_max: env_parse("PRICE_MAX", 100.00),
            min_dollar_vol_m: env_parse("MIN_DOLLAR_VOL_M", 5.0),
            universe_min_expected: env_parse("UNIVERSE_MIN_EXPECTED", 4500),
            universe_k: env_parse("UNIVERSE_K", 3000),
            concurrency: env_parse("CONCURRENCY", 8),
            rate_per_sec: env_parse("RATE_PER_SEC", 5),
            rate_capacity: env_parse("RATE_CAPACITY", 5),
            rvol_window_min: env_parse("RVOL_WINDOW_MIN", 15),
            rvol_threshold: env_parse("RVOL_THRESHOLD", 3.0),
            classification: ClassificationThresholds {
                trade_ready: env_parse("CLASSIFY_TRADE_READY", 75),
                builder: env_parse("CLASSIFY_BUILDER", 70),
                monitor: env_parse("CLASSIFY_MONITOR", 60),
            },
            cache_ttl_seconds: env_parse("CACHE_TTL_SECONDS", 600),
            job_timeout_seconds: env_parse("JOB_TIMEOUT_SECONDS", 900),
            result_ttl_seconds: env_parse("RESULT_TTL_SECONDS", 3600),
            early_stop_scan: env_parse("EARLY_STOP_SCAN", 1500),
            target_trade_ready: env_parse("TARGET_TRADE_READY", 10),
            bind_addr: env_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_key_is_an_error() {
        std::env::remove_var("UPSTREAM_API_KEY");
        std::env::remove_var("STORE_URL");
        let err = DiscoveryConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("UPSTREAM_API_KEY")));
    }

    #[test]
    fn defaults_match_spec_table() {
        std::env::set_var("UPSTREAM_API_KEY", "key");
        std::env::set_var("STORE_URL", "redis://localhost:6379");
        std::env::remove_var("PRICE_MIN");
        std::env::remove_var("UNIVERSE_MIN_EXPECTED");
        let cfg = DiscoveryConfig::from_env().unwrap();
        assert_eq!(cfg.price_min, 0.50);
        assert_eq!(cfg.price_max, 100.00);
        assert_eq!(cfg.universe_min_expected, 4500);
        assert_eq!(cfg.rate_per_sec, 5);
        std::env::remove_var("UPSTREAM_API_KEY");
        std::env::remove_var("STORE_URL");
    }
}
