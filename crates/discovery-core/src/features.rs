use serde::{Deserialize, Serialize};

use crate::symbol::Symbol;

/// Full input to the scorer, assembled from a RawBar history, a Snapshot, and historical
/// aggregates. All numeric; missing optionals are tagged distinctly from zero rather than
/// defaulted in, so the scorer can tell "no data" from "literally zero".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerFeatures {
    pub symbol: Symbol,
    pub price: f64,
    pub dollar_volume: f64,
    pub change_pct: f64,
    pub atr_pct: f64,
    pub rsi: f64,
    pub ema_9: f64,
    pub ema_20: f64,
    pub vwap: f64,
    pub rel_vol_current: f64,
    pub rel_vol_sustained_window: f64,
    pub extension_atrs: f64,
    /// Minutes since the price last crossed above VWAP, if it has this session.
    pub minutes_since_vwap_reclaim: Option<u32>,
    pub short_sale_restricted: bool,

    // Structural fields: frequently absent from the configured upstream. The scorer must
    // degrade to its heuristic path rather than fabricate a value when any of these is None.
    pub float_shares: Option<f64>,
    pub short_interest_pct: Option<f64>,
    pub borrow_rate_pct: Option<f64>,
    pub utilization_pct: Option<f64>,

    pub catalyst: Option<Catalyst>,
    pub social_zscore: Option<f64>,
    pub options_signal: Option<OptionsSignal>,

    /// Count of optional-field reads that came back missing while assembling these features.
    /// Replaces exception-driven control flow: every missing optional increments this instead
    /// of raising, and the coordinator rolls it up into the run's stage stats.
    pub missing_fields: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalystKind {
    Earnings,
    FdaDecision,
    MergerAcquisition,
    Partnership,
    AnalystAction,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalyst {
    pub kind: CatalystKind,
    /// 0.0-1.0 strength multiplier for the catalyst's base score.
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionsSignal {
    pub call_put_oi_ratio: f64,
    pub iv_percentile: f64,
    /// Positive when dealer gamma is estimated long (dampening), negative when short (amplifying).
    pub gamma_sign: i8,
}
