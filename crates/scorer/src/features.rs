use analysis_core::Bar;
use chrono::Utc;
use discovery_core::{HistoricalBar, RawBar, Snapshot, TickerFeatures};
use technical_analysis::{atr, ema, rsi, vwap};

use crate::error::ScorerError;

const MIN_HISTORY_BARS: usize = 20;
const EMA_FAST_PERIOD: usize = 9;
const EMA_SLOW_PERIOD: usize = 20;
const RSI_PERIOD: usize = 14;
const ATR_PERIOD: usize = 14;

/// Converts the discovery-local bar shape into the one `technical-analysis`'s indicator
/// functions expect; a pure adaptation, no data is dropped or invented.
fn to_analysis_bar(bar: &HistoricalBar) -> Bar {
    Bar {
        timestamp: bar.timestamp,
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
        volume: bar.volume,
        vwap: None,
    }
}

/// Assembles the full feature set for one symbol from its raw universe bar, current
/// snapshot, and at-least-20-bar history, computing EMA(9)/EMA(20)/RSI(14)/ATR(14) and a
/// rolling VWAP. Every optional field absent from the inputs increments `missing_fields`
/// instead of failing the symbol outright.
pub fn build_features(
    raw_bar: &RawBar,
    snapshot: &Snapshot,
    history: &[HistoricalBar],
    rel_vol_current: f64,
    rel_vol_sustained_window: f64,
) -> Result<TickerFeatures, ScorerError> {
    if history.len() < MIN_HISTORY_BARS {
        return Err(ScorerError::InsufficientHistory {
            symbol: raw_bar.symbol.to_string(),
            bars: history.len(),
        });
    }

    let mut missing_fields = 0u32;
    let bars: Vec<Bar> = history.iter().map(to_analysis_bar).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ema_9 = ema(&closes, EMA_FAST_PERIOD).last().copied().unwrap_or(snapshot.last_price);
    let ema_20 = ema(&closes, EMA_SLOW_PERIOD).last().copied().unwrap_or(snapshot.last_price);
    let rsi_value = rsi(&closes, RSI_PERIOD).last().copied().unwrap_or(50.0);
    let atr_value = atr(&bars, ATR_PERIOD).last().copied().unwrap_or(0.0);
    let atr_pct = if snapshot.last_price > 0.0 { atr_value / snapshot.last_price * 100.0 } else { 0.0 };

    let rolling_vwap = vwap(&bars).last().copied().or(raw_bar.vwap).unwrap_or_else(|| {
        missing_fields += 1;
        snapshot.last_price
    });

    let extension_atrs = if atr_value > 0.0 {
        (snapshot.last_price - ema_20).abs() / atr_value
    } else {
        0.0
    };

    let change_pct = snapshot.change_pct().unwrap_or_else(|| {
        missing_fields += 1;
        0.0
    });

    Ok(TickerFeatures {
        symbol: raw_bar.symbol.clone(),
        price: snapshot.last_price,
        dollar_volume: snapshot.dollar_volume(),
        change_pct,
        atr_pct,
        rsi: rsi_value,
        ema_9,
        ema_20,
        vwap: rolling_vwap,
        rel_vol_current,
        rel_vol_sustained_window,
        extension_atrs,
        minutes_since_vwap_reclaim: minutes_since_vwap_reclaim(&bars, snapshot.last_price),
        short_sale_restricted: false,
        float_shares: None,
        short_interest_pct: None,
        borrow_rate_pct: None,
        utilization_pct: None,
        catalyst: None,
        social_zscore: None,
        options_signal: None,
        missing_fields,
    })
}

/// Minutes since the close series last crossed from below to above its own rolling VWAP,
/// approximated from daily bars since intraday ticks are not part of this history.
fn minutes_since_vwap_reclaim(bars: &[Bar], current_price: f64) -> Option<u32> {
    let series = vwap(bars);
    let last_vwap = *series.last()?;
    if current_price < last_vwap {
        return None;
    }
    let prev_close = bars.get(bars.len().checked_sub(2)?)?.close;
    let prev_vwap = *series.get(series.len().checked_sub(2)?)?;
    if prev_close < prev_vwap {
        Some(0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery_core::Symbol;
    use chrono::NaiveDate;

    fn history(n: usize) -> Vec<HistoricalBar> {
        (0..n)
            .map(|i| HistoricalBar {
                timestamp: Utc::now() - chrono::Duration::days((n - i) as i64),
                open: 10.0 + i as f64 * 0.1,
                high: 10.5 + i as f64 * 0.1,
                low: 9.5 + i as f64 * 0.1,
                close: 10.0 + i as f64 * 0.1,
                volume: 1_000_000.0,
            })
            .collect()
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            symbol: Symbol::new("ACME").unwrap(),
            last_price: 12.0,
            day_volume: 5_000_000.0,
            prev_close: Some(11.5),
            timestamp: Utc::now(),
        }
    }

    fn raw_bar() -> RawBar {
        RawBar {
            symbol: Symbol::new("ACME").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            open: 11.0,
            high: 11.8,
            low: 10.9,
            close: 11.5,
            volume: 4_000_000.0,
            vwap: Some(11.2),
            prev_close: Some(11.0),
        }
    }

    #[test]
    fn rejects_symbols_with_insufficient_history() {
        let err = build_features(&raw_bar(), &snapshot(), &history(5), 2.0, 2.0).unwrap_err();
        assert!(matches!(err, ScorerError::InsufficientHistory { .. }));
    }

    #[test]
    fn builds_features_with_computed_indicators() {
        let features = build_features(&raw_bar(), &snapshot(), &history(25), 4.0, 3.5).unwrap();
        assert_eq!(features.symbol.as_ref(), "ACME");
        assert_eq!(features.price, 12.0);
        assert!(features.ema_9 > 0.0);
        assert!(features.rsi >= 0.0 && features.rsi <= 100.0);
    }
}
