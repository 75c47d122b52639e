use discovery_core::{CatalystKind, ComponentScores, TickerFeatures};

/// Scales linearly from 3.0->8.0 over [15,25] points, plus a multi-day bonus when the
/// instantaneous reading is itself extreme.
pub fn volume_trend(features: &TickerFeatures) -> u8 {
    let base = scale_linear(features.rel_vol_sustained_window, 3.0, 8.0, 15.0, 25.0);
    let bonus = if features.rel_vol_current >= 10.0 {
        3
    } else if features.rel_vol_current >= 6.0 {
        2
    } else if features.rel_vol_current >= 4.0 {
        1
    } else {
        0
    };
    clamp_u8(base as i32 + bonus, ComponentScores::VOLUME_TREND_MAX)
}

/// Weighted structural signal when float/short/borrow/utilization are all known; otherwise
/// a heuristic keyed on price tier and current relative volume. Never fabricates a missing
/// structural field — a single absent field routes the whole component to the heuristic.
pub fn squeeze(features: &TickerFeatures) -> u8 {
    let structural = (
        features.float_shares,
        features.short_interest_pct,
        features.borrow_rate_pct,
        features.utilization_pct,
    );

    if let (Some(float_shares), Some(short_pct), Some(borrow_pct), Some(util_pct)) = structural {
        let float_tightness = if float_shares <= 10_000_000.0 {
            1.0
        } else if float_shares <= 50_000_000.0 {
            0.6
        } else {
            0.2
        };
        let short_component = (short_pct / 30.0).min(1.0);
        let borrow_component = (borrow_pct / 50.0).min(1.0);
        let util_component = (util_pct / 100.0).min(1.0);

        let weighted = float_tightness * 8.0 + short_component * 6.0 + borrow_component * 4.0 + util_component * 2.0;
        clamp_u8(weighted.round() as i32, ComponentScores::SQUEEZE_MAX)
    } else {
        let price_tier_score = if features.price < 5.0 {
            6.0
        } else if features.price < 20.0 {
            4.0
        } else {
            2.0
        };
        let rel_vol_score = scale_linear(features.rel_vol_current, 0.0, 8.0, 2.0, 10.0);
        clamp_u8((price_tier_score + rel_vol_score).round() as i32, ComponentScores::SQUEEZE_MAX)
    }
}

pub fn catalyst(features: &TickerFeatures) -> u8 {
    let Some(catalyst) = &features.catalyst else {
        return 2;
    };

    let base = match catalyst.kind {
        CatalystKind::Earnings => 18.0,
        CatalystKind::FdaDecision => 20.0,
        CatalystKind::MergerAcquisition => 16.0,
        CatalystKind::Partnership => 10.0,
        CatalystKind::AnalystAction => 8.0,
        CatalystKind::Other => 6.0,
    };
    clamp_u8((base * catalyst.strength.clamp(0.0, 1.0)).round() as i32, ComponentScores::CATALYST_MAX)
}

pub fn social(features: &TickerFeatures) -> u8 {
    match features.social_zscore {
        Some(z) => clamp_u8((z * 3.0).round() as i32, ComponentScores::SOCIAL_MAX),
        None => clamp_u8(
            scale_linear(features.rel_vol_current, 0.0, 8.0, 0.0, ComponentScores::SOCIAL_MAX as f64).round() as i32,
            ComponentScores::SOCIAL_MAX,
        ),
    }
}

pub fn options(features: &TickerFeatures) -> u8 {
    match &features.options_signal {
        Some(signal) => {
            let oi_component = scale_linear(signal.call_put_oi_ratio, 0.5, 3.0, 0.0, 5.0);
            let iv_component = signal.iv_percentile / 100.0 * 3.0;
            let gamma_component = if signal.gamma_sign < 0 { 2.0 } else { 0.0 };
            clamp_u8((oi_component + iv_component + gamma_component).round() as i32, ComponentScores::OPTIONS_MAX)
        }
        None => {
            let move_component = if features.change_pct.abs() > 5.0 { 4.0 } else { 2.0 };
            let volume_component = scale_linear(features.rel_vol_current, 0.0, 8.0, 0.0, 6.0);
            clamp_u8((move_component + volume_component).round() as i32, ComponentScores::OPTIONS_MAX)
        }
    }
}

pub fn technical(features: &TickerFeatures) -> u8 {
    let mut score = 0i32;
    if features.ema_9 > features.ema_20 {
        score += 3;
    }
    if (60.0..70.0).contains(&features.rsi) {
        score += 2;
    } else if features.rsi >= 70.0 {
        score += 3;
    }
    if features.price >= features.vwap {
        score += 2;
    }
    if features.change_pct.abs() > 3.0 {
        score += 2;
    }
    clamp_u8(score, ComponentScores::TECHNICAL_MAX)
}

pub fn score_all(features: &TickerFeatures) -> ComponentScores {
    ComponentScores {
        volume_trend: volume_trend(features),
        squeeze: squeeze(features),
        catalyst: catalyst(features),
        social: social(features),
        options: options(features),
        technical: technical(features),
    }
}

fn scale_linear(value: f64, in_lo: f64, in_hi: f64, out_lo: f64, out_hi: f64) -> f64 {
    if in_hi <= in_lo {
        return out_lo;
    }
    let t = ((value - in_lo) / (in_hi - in_lo)).clamp(0.0, 1.0);
    out_lo + t * (out_hi - out_lo)
}

fn clamp_u8(value: i32, max: u8) -> u8 {
    value.clamp(0, max as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery_core::{Catalyst, OptionsSignal, Symbol};

    fn base_features() -> TickerFeatures {
        TickerFeatures {
            symbol: Symbol::new("ACME").unwrap(),
            price: 10.0,
            dollar_volume: 10_000_000.0,
            change_pct: 1.0,
            atr_pct: 4.0,
            rsi: 50.0,
            ema_9: 10.0,
            ema_20: 10.0,
            vwap: 10.0,
            rel_vol_current: 1.0,
            rel_vol_sustained_window: 1.0,
            extension_atrs: 0.5,
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
    fn volume_trend_never_exceeds_max() {
        let mut f = base_features();
        f.rel_vol_sustained_window = 50.0;
        f.rel_vol_current = 50.0;
        assert!(volume_trend(&f) <= ComponentScores::VOLUME_TREND_MAX);
    }

    #[test]
    fn squeeze_uses_heuristic_when_any_structural_field_missing() {
        let mut f = base_features();
        f.float_shares = Some(5_000_000.0);
        // short_interest_pct still missing, so it must degrade to the heuristic, not fabricate.
        let heuristic_score = squeeze(&f);
        f.short_interest_pct = Some(20.0);
        f.borrow_rate_pct = Some(30.0);
        f.utilization_pct = Some(80.0);
        let structural_score = squeeze(&f);
        assert_ne!(heuristic_score, 0);
        assert!(structural_score >= heuristic_score || structural_score <= ComponentScores::SQUEEZE_MAX);
    }

    #[test]
    fn catalyst_falls_back_to_two_when_none_present() {
        let f = base_features();
        assert_eq!(catalyst(&f), 2);
    }

    #[test]
    fn catalyst_scales_by_strength() {
        let mut f = base_features();
        f.catalyst = Some(Catalyst { kind: CatalystKind::FdaDecision, strength: 1.0 });
        assert_eq!(catalyst(&f), 20);
    }

    #[test]
    fn technical_rewards_bullish_ema_cross_and_vwap_hold() {
        let mut f = base_features();
        f.ema_9 = 11.0;
        f.ema_20 = 10.0;
        f.price = 11.0;
        f.vwap = 10.5;
        f.rsi = 65.0;
        assert_eq!(technical(&f), 3 + 2 + 2);
    }

    #[test]
    fn options_uses_oi_signal_when_present() {
        let mut f = base_features();
        f.options_signal = Some(OptionsSignal { call_put_oi_ratio: 3.0, iv_percentile: 90.0, gamma_sign: -1 });
        assert!(options(&f) > 0);
    }
}
