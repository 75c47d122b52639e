use serde::{Deserialize, Serialize};

/// Funnel counts from one universe load, surfaced through the `/health` contract so
/// operators can see where symbols were dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UniverseStats {
    pub total_fetched: usize,
    pub after_price: usize,
    pub after_fund: usize,
    pub after_volume: usize,
    pub final_count: usize,
}
