mod components;
mod error;
mod features;
mod multiplier;
mod rel_vol;
mod scorer;

pub use components::score_all;
pub use error::ScorerError;
pub use features::build_features;
pub use multiplier::{compute as compute_multiplier, entry_signal};
pub use rel_vol::{HistoricalAverageBaseline, RelVolBaseline, RvolWindowTracker, SessionFractionHeuristic};
pub use scorer::{Scorer, ScorerConfig};
