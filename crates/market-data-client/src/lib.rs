mod client;
mod decode;
mod error;
mod memo_cache;
mod rate_limiter;
mod types;

pub use client::{MarketDataSource, UpstreamClient};
pub use decode::maybe_decompress;
pub use error::ClientError;
pub use rate_limiter::TokenBucket;
pub use types::TickerDetails;
