//! Exponential Moving Average (EMA).
//!
//! Recursive span-based EMA (alpha = 2/(period+1)) seeded at the first
//! value, i.e. pandas' `ewm(span=period, adjust=False)` convention.
//! The recursion makes every value technically defined from bar 0; the
//! public series masks the first `period - 1` values as NaN so the common
//! warm-up invariant holds.

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut out = ema_series(&closes(bars), self.period);
        mask_warmup(&mut out, self.lookback());
        out
    }
}

/// Unmasked recursive EMA. Used internally by ZLEMA, which needs the raw
/// recursion for its EMA-of-EMA term.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n == 0 {
        return out;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[0];
    out[0] = prev;
    for i in 1..n {
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        out[i] = prev;
    }
    out
}

pub(crate) fn mask_warmup(values: &mut [f64], lookback: usize) {
    for v in values.iter_mut().take(lookback) {
        *v = f64::NAN;
    }
}
