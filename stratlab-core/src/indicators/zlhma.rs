//! Zero-Lag Hull Moving Average (ZLHMA).
//!
//! `HMA + (HMA - HMA shifted by floor((period-1)/2))` — the Hull average
//! plus its own displacement over half a period, pushing the lag below
//! even the HMA's.

use super::hma::{hma_lookback, hma_series};
use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Zlhma {
    period: usize,
    name: String,
}

impl Zlhma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 4, "ZLHMA period must be >= 4");
        Self {
            period,
            name: format!("zlhma_{period}"),
        }
    }

    fn lag(&self) -> usize {
        (self.period - 1) / 2
    }
}

impl Indicator for Zlhma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        hma_lookback(self.period) + self.lag()
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let hma = hma_series(&closes(bars), self.period);
        let lag = self.lag();
        let n = hma.len();
        let mut out = vec![f64::NAN; n];
        for i in lag..n {
            out[i] = hma[i] + (hma[i] - hma[i - lag]);
        }
        out
    }
}
