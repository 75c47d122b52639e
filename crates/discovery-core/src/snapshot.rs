use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::symbol::Symbol;

/// Current-session state for a symbol, produced by the snapshot filter. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: Symbol,
    pub last_price: f64,
    pub day_volume: f64,
    pub prev_close: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    pub fn dollar_volume(&self) -> f64 {
        self.last_price * self.day_volume
    }

    pub fn change_pct(&self) -> Option<f64> {
        self.prev_close
            .filter(|p| *p > 0.0)
            .map(|p| (self.last_price - p) / p * 100.0)
    }
}
