//! Zero-Lag EMA (ZLEMA): `2*EMA(close, period) - EMA(EMA(close, period), period)`.

use super::ema::{ema_series, mask_warmup};
use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Zlema {
    period: usize,
    name: String,
}

impl Zlema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ZLEMA period must be >= 1");
        Self {
            period,
            name: format!("zlema_{period}"),
        }
    }
}

impl Indicator for Zlema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        // The inner EMA settles after period-1 bars, the outer EMA-of-EMA
        // after another period-1.
        2 * (self.period - 1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values = closes(bars);
        let ema1 = ema_series(&values, self.period);
        let ema2 = ema_series(&ema1, self.period);
        let mut out: Vec<f64> = ema1
            .iter()
            .zip(&ema2)
            .map(|(a, b)| 2.0 * a - b)
            .collect();
        mask_warmup(&mut out, self.lookback());
        out
    }
}
