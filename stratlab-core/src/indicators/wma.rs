//! Weighted Moving Average (WMA).
//!
//! Linearly weighted average over a trailing window: weights 1..period,
//! most recent bar carries weight `period`.

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Wma {
    period: usize,
    name: String,
}

impl Wma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "WMA period must be >= 1");
        Self {
            period,
            name: format!("wma_{period}"),
        }
    }
}

impl Indicator for Wma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        wma_series(&closes(bars), self.period)
    }
}

/// WMA over an arbitrary value series. Windows containing NaN yield NaN.
pub fn wma_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    let weight_sum = (period * (period + 1)) as f64 / 2.0;
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let dot: f64 = window
            .iter()
            .enumerate()
            .map(|(k, v)| v * (k + 1) as f64)
            .sum();
        out[i] = dot / weight_sum;
    }
    out
}
