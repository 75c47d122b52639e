pub mod bar;
pub mod cache_entry;
pub mod candidate;
pub mod config;
pub mod error;
pub mod features;
pub mod job;
pub mod result;
pub mod scores;
pub mod snapshot;
pub mod symbol;

pub use bar::{HistoricalBar, RawBar};
pub use cache_entry::CacheEntry;
pub use candidate::{sort_candidates, Candidate, TechnicalSnapshot};
pub use config::{ConfigError, DiscoveryConfig};
pub use error::ErrorKind;
pub use features::{Catalyst, CatalystKind, OptionsSignal, TickerFeatures};
pub use job::{DiscoveryJob, JobError, JobRecord, JobState};
pub use result::{DiscoveryResult, ENGINE_VERSION, SCHEMA_VERSION};
pub use scores::{Classification, ClassificationThresholds, ComponentScores};
pub use snapshot::Snapshot;
pub use symbol::{Symbol, SymbolError};
