use discovery_core::TickerFeatures;

/// Applies the three independent multiplier rules in sequence, starting at 1.0.
pub fn compute(features: &TickerFeatures) -> f64 {
    let mut multiplier = 1.0;

    let recent_vwap_reclaim = features
        .minutes_since_vwap_reclaim
        .map(|m| m <= 10)
        .unwrap_or(false);
    if (features.price < features.vwap && !recent_vwap_reclaim) || features.rsi < 55.0 {
        multiplier *= 0.7;
    }

    if features.extension_atrs > 3.0 {
        multiplier *= 0.8;
    }

    if features.short_sale_restricted {
        multiplier *= 0.9;
    }

    multiplier
}

/// True iff the hard price cap is satisfied and either an extended intraday move or a
/// recent VWAP reclaim coincides with sustained relative volume.
pub fn entry_signal(features: &TickerFeatures, price_max: f64, rvol_threshold: f64) -> bool {
    if features.price > price_max {
        return false;
    }

    let sustained_volume = features.rel_vol_sustained_window >= rvol_threshold;
    let strong_move = features.change_pct.abs() > 2.0 && sustained_volume;
    let fresh_reclaim = features
        .minutes_since_vwap_reclaim
        .map(|m| m <= 10)
        .unwrap_or(false)
        && sustained_volume;

    strong_move || fresh_reclaim
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery_core::Symbol;

    fn base_features() -> TickerFeatures {
        TickerFeatures {
            symbol: Symbol::new("ACME").unwrap(),
            price: 10.0,
            dollar_volume: 10_000_000.0,
            change_pct: 1.0,
            atr_pct: 4.0,
            rsi: 60.0,
            ema_9: 10.0,
            ema_20: 10.0,
            vwap: 9.5,
            rel_vol_current: 4.0,
            rel_vol_sustained_window: 4.0,
            extension_atrs: 1.0,
            minutes_since_vwap_reclaim: None,
            short_sale_restricted: false,
            float_shares: None,
            short_interest_pct: None,
            borrow_rate_pct: None,
            utilization_pct: None,
            catalyst: None,
            social_zscore: None,
            options_signal: None,
            missing_fields: 0,
        }
    }

    #[test]
    fn no_penalties_when_price_holds_vwap_and_rsi_strong() {
        assert_eq!(compute(&base_features()), 1.0);
    }

    #[test]
    fn below_vwap_without_reclaim_applies_penalty() {
        let mut f = base_features();
        f.price = 9.0;
        assert!((compute(&f) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn low_rsi_applies_penalty_even_above_vwap() {
        let mut f = base_features();
        f.rsi = 40.0;
        assert!((compute(&f) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn over_extension_stacks_with_vwap_penalty() {
        let mut f = base_features();
        f.price = 9.0;
        f.extension_atrs = 4.0;
        assert!((compute(&f) - 0.7 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn entry_signal_true_for_strong_sustained_move() {
        let mut f = base_features();
        f.change_pct = 3.0;
        assert!(entry_signal(&f, 100.0, 3.0));
    }

    #[test]
    fn entry_signal_false_above_price_cap() {
        let mut f = base_features();
        f.change_pct = 5.0;
        f.price = 150.0;
        assert!(!entry_signal(&f, 100.0, 3.0));
    }

    #[test]
    fn entry_signal_true_on_fresh_vwap_reclaim() {
        let mut f = base_features();
        f.change_pct = 0.1;
        f.minutes_since_vwap_reclaim = Some(5);
        assert!(entry_signal(&f, 100.0, 3.0));
    }
}
