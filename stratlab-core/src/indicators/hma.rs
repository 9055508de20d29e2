//! Hull Moving Average (HMA).
//!
//! `WMA(2*WMA(close, period/2) - WMA(close, period), round(sqrt(period)))`
//! with integer-truncated sub-periods.

use super::wma::wma_series;
use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Hma {
    period: usize,
    name: String,
}

impl Hma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 4, "HMA period must be >= 4");
        Self {
            period,
            name: format!("hma_{period}"),
        }
    }
}

impl Indicator for Hma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        hma_lookback(self.period)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        hma_series(&closes(bars), self.period)
    }
}

pub(crate) fn sqrt_period(period: usize) -> usize {
    (period as f64).sqrt() as usize
}

pub(crate) fn hma_lookback(period: usize) -> usize {
    // The raw 2*WMA(half) - WMA(full) term is NaN through period-2; the
    // final smoothing WMA adds sqrt(period)-1 more bars.
    (period - 1) + (sqrt_period(period) - 1)
}

/// HMA over an arbitrary value series.
pub fn hma_series(values: &[f64], period: usize) -> Vec<f64> {
    let half = period / 2;
    let sqrt_len = sqrt_period(period);

    let wma_half = wma_series(values, half);
    let wma_full = wma_series(values, period);

    let raw: Vec<f64> = wma_half
        .iter()
        .zip(&wma_full)
        .map(|(h, f)| 2.0 * h - f)
        .collect();

    wma_series(&raw, sqrt_len)
}
