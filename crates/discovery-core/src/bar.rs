use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::symbol::Symbol;

/// One session's OHLCV for a symbol, as returned by the grouped-daily endpoint. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
    #[serde(default)]
    pub prev_close: Option<f64>,
}

impl RawBar {
    pub fn dollar_volume(&self) -> f64 {
        self.close * self.volume
    }

    pub fn change_pct(&self) -> Option<f64> {
        self.prev_close
            .filter(|p| *p > 0.0)
            .map(|p| (self.close - p) / p * 100.0)
    }
}

/// A historical daily aggregate bar, used for indicator computation over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
