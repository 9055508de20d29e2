//! Ichimoku Cloud components.
//!
//! Tenkan and Kijun are midpoints of rolling high/low ranges. The senkou
//! spans are the same midpoint construction projected forward: the value
//! computed at bar `i` is stored at bar `i + cloud_shift`, so reading the
//! span at the current index compares price against a cloud drawn from
//! strictly older bars.

use super::{rolling_max, rolling_min, Indicator};
use crate::domain::Bar;

/// Which Ichimoku line this instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IchimokuLine {
    Tenkan,
    Kijun,
    SpanA,
    SpanB,
    /// `max(span_a, span_b)` at each index.
    CloudTop,
    /// `min(span_a, span_b)` at each index.
    CloudBottom,
}

#[derive(Debug, Clone)]
pub struct Ichimoku {
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
    cloud_shift: usize,
    line: IchimokuLine,
    name: String,
}

impl Ichimoku {
    pub fn new(
        tenkan_period: usize,
        kijun_period: usize,
        senkou_b_period: usize,
        cloud_shift: usize,
        line: IchimokuLine,
    ) -> Self {
        assert!(tenkan_period >= 1 && kijun_period >= 1 && senkou_b_period >= 1);
        let tag = match line {
            IchimokuLine::Tenkan => "tenkan",
            IchimokuLine::Kijun => "kijun",
            IchimokuLine::SpanA => "span_a",
            IchimokuLine::SpanB => "span_b",
            IchimokuLine::CloudTop => "cloud_top",
            IchimokuLine::CloudBottom => "cloud_bottom",
        };
        let name = format!("ichimoku_{tag}_{tenkan_period}_{kijun_period}_{senkou_b_period}");
        Self {
            tenkan_period,
            kijun_period,
            senkou_b_period,
            cloud_shift,
            line,
            name,
        }
    }

    fn midpoint(bars: &[Bar], period: usize) -> Vec<f64> {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        rolling_max(&highs, period)
            .iter()
            .zip(rolling_min(&lows, period))
            .map(|(h, l)| (h + l) / 2.0)
            .collect()
    }

    fn shift_forward(series: Vec<f64>, shift: usize) -> Vec<f64> {
        let len = series.len();
        let mut out = vec![f64::NAN; len];
        for (i, v) in series.into_iter().enumerate() {
            if i + shift < len {
                out[i + shift] = v;
            }
        }
        out
    }

    fn span_a(&self, bars: &[Bar]) -> Vec<f64> {
        let tenkan = Self::midpoint(bars, self.tenkan_period);
        let kijun = Self::midpoint(bars, self.kijun_period);
        let raw: Vec<f64> = tenkan
            .iter()
            .zip(&kijun)
            .map(|(t, k)| (t + k) / 2.0)
            .collect();
        Self::shift_forward(raw, self.cloud_shift)
    }

    fn span_b(&self, bars: &[Bar]) -> Vec<f64> {
        Self::shift_forward(Self::midpoint(bars, self.senkou_b_period), self.cloud_shift)
    }
}

impl Indicator for Ichimoku {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            IchimokuLine::Tenkan => self.tenkan_period - 1,
            IchimokuLine::Kijun => self.kijun_period - 1,
            IchimokuLine::SpanA => {
                self.tenkan_period.max(self.kijun_period) - 1 + self.cloud_shift
            }
            IchimokuLine::SpanB => self.senkou_b_period - 1 + self.cloud_shift,
            IchimokuLine::CloudTop | IchimokuLine::CloudBottom => {
                self.tenkan_period
                    .max(self.kijun_period)
                    .max(self.senkou_b_period)
                    - 1
                    + self.cloud_shift
            }
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        match self.line {
            IchimokuLine::Tenkan => Self::midpoint(bars, self.tenkan_period),
            IchimokuLine::Kijun => Self::midpoint(bars, self.kijun_period),
            IchimokuLine::SpanA => self.span_a(bars),
            IchimokuLine::SpanB => self.span_b(bars),
            IchimokuLine::CloudTop => self
                .span_a(bars)
                .iter()
                .zip(self.span_b(bars))
                .map(|(a, b)| a.max(b))
                .collect(),
            IchimokuLine::CloudBottom => self
                .span_a(bars)
                .iter()
                .zip(self.span_b(bars))
                .map(|(a, b)| a.min(b))
                .collect(),
        }
    }
}
