//! Indicator library — pure functions from a bar series to derived series.
//!
//! All indicators implement the `Indicator` trait and are precomputed once
//! before the bar loop into an `IndicatorFrame`. Rolling windows are
//! trailing and right-aligned; the only declared look-ahead is the
//! Ichimoku cloud shift, which stores values *forward* so reading at the
//! current index still uses only past bars.
//!
//! Multi-series indicators (Ichimoku, ADX/DI, Donchian) are exposed as
//! separate named instances per band, keeping the single-series trait
//! unchanged.

pub mod adx;
pub mod atr;
pub mod donchian;
pub mod ema;
pub mod hma;
pub mod ichimoku;
pub mod rsi;
pub mod wma;
pub mod zlema;
pub mod zlhma;

pub use adx::{Adx, AdxSeries};
pub use atr::Atr;
pub use donchian::{Donchian, DonchianBand};
pub use ema::Ema;
pub use hma::Hma;
pub use ichimoku::{Ichimoku, IchimokuLine};
pub use rsi::Rsi;
pub use wma::Wma;
pub use zlema::Zlema;
pub use zlhma::Zlhma;

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warm-up),
/// never silently zero.
///
/// No indicator value at bar t may depend on price data from bar t+1 or
/// later.
pub trait Indicator: Send + Sync {
    /// Series name (e.g. "zlhma_14", "adx_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator series, aligned 1:1 with the bars.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precompute a set of indicators over a bar series. Indicators with
    /// duplicate names are computed once.
    pub fn build(indicators: &[Box<dyn Indicator>], bars: &[Bar]) -> Self {
        let mut frame = Self::new();
        for ind in indicators {
            if !frame.series.contains_key(ind.name()) {
                frame.insert(ind.name(), ind.compute(bars));
            }
        }
        frame
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value at a bar index; `None` when the series is absent or the index
    /// is out of bounds. Warm-up values come back as `Some(NaN)`.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name).and_then(|v| v.get(index).copied())
    }

    /// Value at a bar index, filtered to finite numbers. Warm-up NaNs and
    /// missing series both come back as `None`, so callers cannot coerce
    /// "not ready" into a numeric default.
    pub fn finite(&self, name: &str, index: usize) -> Option<f64> {
        self.get(name, index).filter(|v| v.is_finite())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Rolling maximum over a trailing window; NaN before warm-up.
pub(crate) fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Rolling minimum over a trailing window; NaN before warm-up.
pub(crate) fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

/// Rolling mean over a trailing window; NaN before warm-up.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        w.iter().sum::<f64>() / period as f64
    })
}

/// Apply `f` to every trailing window of `period` values. Windows that
/// contain NaN yield NaN so warm-up gaps propagate instead of skewing.
fn rolling(values: &[f64], period: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(window);
    }
    out
}

/// Close series extracted from bars.
pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev close (or close for the first
/// bar), high/low bracket open/close by 0.25, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::hours(4 * i as i64),
                open,
                high: open.max(close) + 0.25,
                low: open.min(close) - 0.25,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_insert_and_get() {
        let mut frame = IndicatorFrame::new();
        frame.insert("atr_14", vec![f64::NAN, 1.5, 2.0]);
        assert!(frame.get("atr_14", 0).unwrap().is_nan());
        assert_eq!(frame.get("atr_14", 1), Some(1.5));
        assert_eq!(frame.get("atr_14", 3), None); // out of bounds
    }

    #[test]
    fn finite_filters_warmup_nan() {
        let mut frame = IndicatorFrame::new();
        frame.insert("x", vec![f64::NAN, 1.0]);
        assert_eq!(frame.finite("x", 0), None);
        assert_eq!(frame.finite("x", 1), Some(1.0));
        assert_eq!(frame.finite("missing", 0), None);
    }

    #[test]
    fn rolling_mean_warmup() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 2.0, 1e-12);
        assert_approx(out[3], 3.0, 1e-12);
    }

    #[test]
    fn rolling_propagates_nan_windows() {
        let out = rolling_max(&[f64::NAN, 2.0, 3.0, 4.0], 2);
        assert!(out[1].is_nan()); // window contains the NaN
        assert_approx(out[2], 3.0, 1e-12);
    }
}
