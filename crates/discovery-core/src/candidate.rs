use serde::{Deserialize, Serialize};

use crate::scores::{Classification, ComponentScores};
use crate::symbol::Symbol;

/// A scored, surviving symbol. Only non-`Ignore` candidates are ever constructed by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: Symbol,
    pub price: f64,
    pub volume: f64,
    pub dollar_volume: f64,
    pub change_pct: f64,
    pub rel_vol_current: f64,
    pub rel_vol_sustained: f64,
    pub component_scores: ComponentScores,
    pub total_score: u8,
    pub classification: Classification,
    pub entry_signal: bool,
    pub technical_snapshot: TechnicalSnapshot,
}

/// A small, serializable summary of the technical state used for the `technical` component,
/// carried on the candidate so callers can explain a score without re-deriving indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub ema_9: f64,
    pub ema_20: f64,
    pub rsi: f64,
    pub vwap: f64,
    pub atr_pct: f64,
}

impl Candidate {
    /// Ordering key for ranking: `(-total_score, -dollar_volume, symbol)`.
    pub fn sort_key(&self) -> (std::cmp::Reverse<u8>, std::cmp::Reverse<OrderedF64>, &str) {
        (
            std::cmp::Reverse(self.total_score),
            std::cmp::Reverse(OrderedF64(self.dollar_volume)),
            self.symbol.as_str(),
        )
    }
}

/// Thin wrapper giving `f64` a total order for sort-key purposes. Dollar volume is always
/// finite in practice (derived from finite price/volume), so `NaN` is only reachable from
/// malformed upstream data, which is rejected upstream of scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedF64(pub f64);

impl Eq for OrderedF64 {}

impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Sorts candidates in place by the ranking order defined in the spec:
/// total_score desc, then dollar_volume desc, then symbol asc.
pub fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::ComponentScores;

    fn candidate(symbol: &str, total_score: u8, dollar_volume: f64) -> Candidate {
        Candidate {
            symbol: Symbol::new(symbol).unwrap(),
            price: 10.0,
            volume: 1_000_000.0,
            dollar_volume,
            change_pct: 5.0,
            rel_vol_current: 4.0,
            rel_vol_sustained: 3.5,
            component_scores: ComponentScores {
                volume_trend: 10,
                squeeze: 5,
                catalyst: 5,
                social: 3,
                options: 2,
                technical: 5,
            },
            total_score,
            classification: Classification::Monitor,
            entry_signal: false,
            technical_snapshot: TechnicalSnapshot {
                ema_9: 10.1,
                ema_20: 9.9,
                rsi: 61.0,
                vwap: 9.95,
                atr_pct: 4.0,
            },
        }
    }

    #[test]
    fn sorts_by_total_score_desc_then_dollar_volume_desc_then_symbol_asc() {
        let mut candidates = vec![
            candidate("ZZZ", 80, 1_000.0),
            candidate("AAA", 80, 1_000.0),
            candidate("BBB", 90, 500.0),
            candidate("CCC", 80, 2_000.0),
        ];
        sort_candidates(&mut candidates);
        let order: Vec<&str> = candidates.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(order, vec!["BBB", "CCC", "AAA", "ZZZ"]);
    }
}
