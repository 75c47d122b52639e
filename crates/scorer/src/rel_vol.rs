use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use discovery_core::Symbol;

/// Derives the baseline volume a symbol's current volume is compared against. Pluggable so
/// the hour-of-day heuristic can be swapped for a richer model without touching the scorer.
pub trait RelVolBaseline: Send + Sync {
    /// Expected volume for the full session, given whatever history is available.
    fn baseline(&self, symbol: &Symbol, historical_avg_volume: Option<f64>, now: DateTime<Utc>) -> f64;
}

/// Baseline is the symbol's own historical average daily volume, when known.
pub struct HistoricalAverageBaseline;

impl RelVolBaseline for HistoricalAverageBaseline {
    fn baseline(&self, _symbol: &Symbol, historical_avg_volume: Option<f64>, _now: DateTime<Utc>) -> f64 {
        historical_avg_volume.unwrap_or(0.0)
    }
}

/// Falls back to an expected-session-fraction heuristic keyed on hour-of-day when no
/// history is available: early session hours imply a smaller fraction of the day's volume
/// has printed yet, so the same raw volume implies a higher relative baseline miss.
pub struct SessionFractionHeuristic {
    fallback_daily_volume: f64,
}

impl SessionFractionHeuristic {
    pub fn new(fallback_daily_volume: f64) -> Self {
        Self { fallback_daily_volume }
    }

    fn expected_session_fraction(hour_utc: u32) -> f64 {
        // Market hours 14:30-21:00 UTC (9:30-16:00 ET). Linear ramp across the session.
        match hour_utc {
            0..=13 => 0.02,
            14 => 0.10,
            15 => 0.30,
            16 => 0.45,
            17 => 0.60,
            18 => 0.72,
            19 => 0.85,
            20 => 0.95,
            _ => 1.0,
        }
    }
}

impl RelVolBaseline for SessionFractionHeuristic {
    fn baseline(&self, _symbol: &Symbol, historical_avg_volume: Option<f64>, now: DateTime<Utc>) -> f64 {
        let full_day = historical_avg_volume.unwrap_or(self.fallback_daily_volume);
        full_day * Self::expected_session_fraction(now.format("%H").to_string().parse().unwrap_or(16))
    }
}

/// Owns the sliding window of `rel_vol_current` readings per symbol for one run. Never
/// shared across runs and never mutated outside the scoring task for its own symbol.
#[derive(Default)]
pub struct RvolWindowTracker {
    windows: HashMap<Symbol, VecDeque<(DateTime<Utc>, f64)>>,
}

impl RvolWindowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new reading and returns the sustained rel-vol: the mean of readings within
    /// `window_minutes` that exceed `threshold`. A first-time symbol seeds the window with
    /// the current reading, so `rel_vol_sustained` is never fabricated for a brand-new entry.
    pub fn record_and_sustain(
        &mut self,
        symbol: &Symbol,
        rel_vol_current: f64,
        now: DateTime<Utc>,
        window_minutes: i64,
        threshold: f64,
    ) -> f64 {
        let window = self.windows.entry(symbol.clone()).or_default();
        window.push_back((now, rel_vol_current));

        let cutoff = now - Duration::minutes(window_minutes);
        while let Some((ts, _)) = window.front() {
            if *ts < cutoff {
                window.pop_front();
            } else {
                break;
            }
        }

        let qualifying: Vec<f64> = window.iter().filter(|(_, v)| *v >= threshold).map(|(_, v)| *v).collect();
        if qualifying.is_empty() {
            rel_vol_current
        } else {
            qualifying.iter().sum::<f64>() / qualifying.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_time_symbol_is_seeded_with_current_reading() {
        let mut tracker = RvolWindowTracker::new();
        let sym = Symbol::new("ACME").unwrap();
        let sustained = tracker.record_and_sustain(&sym, 1.5, Utc::now(), 15, 3.0);
        assert_eq!(sustained, 1.5);
    }

    #[test]
    fn sustained_averages_only_qualifying_readings_in_window() {
        let mut tracker = RvolWindowTracker::new();
        let sym = Symbol::new("ACME").unwrap();
        let t0 = Utc::now();
        tracker.record_and_sustain(&sym, 4.0, t0, 15, 3.0);
        tracker.record_and_sustain(&sym, 2.0, t0 + Duration::minutes(1), 15, 3.0);
        let sustained = tracker.record_and_sustain(&sym, 6.0, t0 + Duration::minutes(2), 15, 3.0);
        assert_eq!(sustained, 5.0);
    }

    #[test]
    fn readings_outside_window_are_dropped() {
        let mut tracker = RvolWindowTracker::new();
        let sym = Symbol::new("ACME").unwrap();
        let t0 = Utc::now();
        tracker.record_and_sustain(&sym, 10.0, t0, 15, 3.0);
        let sustained = tracker.record_and_sustain(&sym, 5.0, t0 + Duration::minutes(20), 15, 3.0);
        assert_eq!(sustained, 5.0);
    }

    #[test]
    fn historical_average_baseline_uses_known_history() {
        let baseline = HistoricalAverageBaseline;
        let sym = Symbol::new("ACME").unwrap();
        assert_eq!(baseline.baseline(&sym, Some(1_000_000.0), Utc::now()), 1_000_000.0);
        assert_eq!(baseline.baseline(&sym, None, Utc::now()), 0.0);
    }
}
