mod error;
mod filters;
mod loader;
mod snapshot_filter;
mod stats;
mod trading_date;

pub use error::UniverseError;
pub use filters::is_fund_like;
pub use loader::{UniverseEntry, UniverseLoader, UniverseLoaderConfig};
pub use snapshot_filter::{SnapshotFilter, SnapshotFilterConfig};
pub use stats::UniverseStats;
pub use trading_date::most_recent_trading_date;
