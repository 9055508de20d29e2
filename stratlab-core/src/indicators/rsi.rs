//! Relative Strength Index (RSI).
//!
//! Rolling-mean average gain/loss (not Wilder's recursion), RS = gain/loss,
//! RSI = 100 - 100/(1+RS). Degenerate windows: zero losses with gains is
//! 100, a fully flat window is neutral 50.

use super::{closes, rolling_mean, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        // The first delta appears at index 1, so a full window of deltas
        // needs period+1 bars.
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values = closes(bars);
        let n = values.len();
        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let delta = values[i] - values[i - 1];
            gains[i] = delta.max(0.0);
            losses[i] = (-delta).max(0.0);
        }

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(g, l)| {
                if g.is_nan() || l.is_nan() {
                    f64::NAN
                } else if *l > 0.0 {
                    let rs = g / l;
                    100.0 - 100.0 / (1.0 + rs)
                } else if *g > 0.0 {
                    100.0
                } else {
                    50.0
                }
            })
            .collect()
    }
}
