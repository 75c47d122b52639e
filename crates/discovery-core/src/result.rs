use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u32 = 1;

/// One complete pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub strategy_tag: String,
    pub universe_count: usize,
    pub prefilter_count: usize,
    pub snapshot_count: usize,
    pub scored_count: usize,
    /// Ordered desc by `total_score` (see `candidate::sort_candidates`).
    pub candidates: Vec<Candidate>,
    pub stage_timings_ms: HashMap<String, u64>,
    pub engine_version: String,
    pub schema_version: u32,
}

impl DiscoveryResult {
    /// True iff every symbol in `candidates` is unique, per the spec invariant.
    pub fn has_unique_symbols(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.candidates.iter().all(|c| seen.insert(c.symbol.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::TechnicalSnapshot;
    use crate::scores::{Classification, ComponentScores};
    use crate::symbol::Symbol;

    fn candidate(symbol: &str) -> Candidate {
        Candidate {
            symbol: Symbol::new(symbol).unwrap(),
            price: 10.0,
            volume: 1.0,
            dollar_volume: 1.0,
            change_pct: 1.0,
            rel_vol_current: 1.0,
            rel_vol_sustained: 1.0,
            component_scores: ComponentScores {
                volume_trend: 1,
                squeeze: 1,
                catalyst: 1,
                social: 1,
                options: 1,
                technical: 1,
            },
            total_score: 61,
            classification: Classification::Monitor,
            entry_signal: false,
            technical_snapshot: TechnicalSnapshot {
                ema_9: 1.0,
                ema_20: 1.0,
                rsi: 1.0,
                vwap: 1.0,
                atr_pct: 1.0,
            },
        }
    }

    #[test]
    fn detects_duplicate_symbols() {
        let now = Utc::now();
        let mut result = DiscoveryResult {
            run_id: "r1".into(),
            started_at: now,
            finished_at: now,
            strategy_tag: "hybrid_v1".into(),
            universe_count: 1,
            prefilter_count: 1,
            snapshot_count: 1,
            scored_count: 2,
            candidates: vec![candidate("AAA"), candidate("BBB")],
            stage_timings_ms: HashMap::new(),
            engine_version: ENGINE_VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
        };
        assert!(result.has_unique_symbols());

        result.candidates.push(candidate("AAA"));
        assert!(!result.has_unique_symbols());
    }
}
