//! ADX / Directional Indicators.
//!
//! True range and directional movement smoothed by rolling mean over the
//! period (not Wilder's recursive smoothing — preserved from the source
//! system); DX = 100*|+DI - -DI|/(+DI + -DI); ADX = rolling mean of DX.

use super::atr::true_range;
use super::{rolling_mean, Indicator};
use crate::domain::Bar;

/// Which series of the ADX computation this instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdxSeries {
    Adx,
    DiPlus,
    DiMinus,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    series: AdxSeries,
    name: String,
}

impl Adx {
    pub fn new(period: usize, series: AdxSeries) -> Self {
        assert!(period >= 2, "ADX period must be >= 2");
        let name = match series {
            AdxSeries::Adx => format!("adx_{period}"),
            AdxSeries::DiPlus => format!("di_plus_{period}"),
            AdxSeries::DiMinus => format!("di_minus_{period}"),
        };
        Self { period, series, name }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.series {
            // DI needs one rolling window; ADX stacks a second one on DX.
            AdxSeries::DiPlus | AdxSeries::DiMinus => self.period - 1,
            AdxSeries::Adx => 2 * (self.period - 1),
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut dm_plus = vec![0.0; n];
        let mut dm_minus = vec![0.0; n];
        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            if up > down {
                dm_plus[i] = up.max(0.0);
            } else if down > up {
                dm_minus[i] = down.max(0.0);
            }
        }

        let atr = rolling_mean(&true_range(bars), self.period);
        let dm_plus_avg = rolling_mean(&dm_plus, self.period);
        let dm_minus_avg = rolling_mean(&dm_minus, self.period);

        let di = |avg: &[f64]| -> Vec<f64> {
            avg.iter()
                .zip(&atr)
                .map(|(dm, a)| if *a > 0.0 { 100.0 * dm / a } else { f64::NAN })
                .collect()
        };
        let di_plus = di(&dm_plus_avg);
        let di_minus = di(&dm_minus_avg);

        match self.series {
            AdxSeries::DiPlus => di_plus,
            AdxSeries::DiMinus => di_minus,
            AdxSeries::Adx => {
                let dx: Vec<f64> = di_plus
                    .iter()
                    .zip(&di_minus)
                    .map(|(p, m)| {
                        let sum = p + m;
                        if sum > 0.0 {
                            100.0 * (p - m).abs() / sum
                        } else {
                            f64::NAN
                        }
                    })
                    .collect();
                rolling_mean(&dx, self.period)
            }
        }
    }
}
