//! Ichimoku cloud trend strategy.
//!
//! The primary condition is a close breaking out of the cloud (above the
//! cloud top for longs, below the cloud bottom for shorts). Tenkan/Kijun
//! alignment carries the momentum weight; cloud color and price location
//! relative to the Kijun confirm.

use crate::domain::{Bar, Direction, ExitReason};
use crate::indicators::{Ichimoku, IchimokuLine, Indicator, IndicatorFrame};

use super::{
    ExitResult, RegimeGate, SignalEvaluator, SignalResult, WEIGHT_CONFIRM, WEIGHT_MOMENTUM,
    WEIGHT_PRIMARY,
};

#[derive(Debug, Clone)]
pub struct IchimokuTrend {
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
    cloud_shift: usize,
    gate: RegimeGate,
    signal_threshold: f64,
    tenkan_key: String,
    kijun_key: String,
    span_a_key: String,
    span_b_key: String,
    cloud_top_key: String,
    cloud_bottom_key: String,
}

impl IchimokuTrend {
    pub fn new(
        tenkan_period: usize,
        kijun_period: usize,
        senkou_b_period: usize,
        cloud_shift: usize,
        gate: RegimeGate,
        signal_threshold: f64,
    ) -> Self {
        let key = |line: IchimokuLine| {
            Ichimoku::new(tenkan_period, kijun_period, senkou_b_period, cloud_shift, line)
                .name()
                .to_owned()
        };
        Self {
            tenkan_period,
            kijun_period,
            senkou_b_period,
            cloud_shift,
            gate,
            signal_threshold,
            tenkan_key: key(IchimokuLine::Tenkan),
            kijun_key: key(IchimokuLine::Kijun),
            span_a_key: key(IchimokuLine::SpanA),
            span_b_key: key(IchimokuLine::SpanB),
            cloud_top_key: key(IchimokuLine::CloudTop),
            cloud_bottom_key: key(IchimokuLine::CloudBottom),
        }
    }

    fn line(&self, line: IchimokuLine) -> Box<dyn Indicator> {
        Box::new(Ichimoku::new(
            self.tenkan_period,
            self.kijun_period,
            self.senkou_b_period,
            self.cloud_shift,
            line,
        ))
    }
}

impl SignalEvaluator for IchimokuTrend {
    fn name(&self) -> &str {
        "ichimoku_trend"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            self.line(IchimokuLine::Tenkan),
            self.line(IchimokuLine::Kijun),
            self.line(IchimokuLine::SpanA),
            self.line(IchimokuLine::SpanB),
            self.line(IchimokuLine::CloudTop),
            self.line(IchimokuLine::CloudBottom),
            self.gate.indicator(),
        ]
    }

    fn warmup_bars(&self) -> usize {
        let cloud = self
            .tenkan_period
            .max(self.kijun_period)
            .max(self.senkou_b_period)
            - 1
            + self.cloud_shift;
        // +1 for the previous-bar breakout read.
        cloud.max(self.gate.lookback()) + 1
    }

    fn evaluate_entry(
        &self,
        bars: &[Bar],
        index: usize,
        frame: &IndicatorFrame,
        direction: Direction,
    ) -> SignalResult {
        let mut result = SignalResult::none(direction);
        if index < 1 || !self.gate.permits(frame, index) {
            return result;
        }
        let (Some(tenkan), Some(kijun), Some(span_a), Some(span_b)) = (
            frame.finite(&self.tenkan_key, index),
            frame.finite(&self.kijun_key, index),
            frame.finite(&self.span_a_key, index),
            frame.finite(&self.span_b_key, index),
        ) else {
            return result;
        };
        let close = bars[index].close;
        let prev_close = bars[index - 1].close;

        match direction {
            Direction::Long => {
                let (Some(top), Some(top_prev)) = (
                    frame.finite(&self.cloud_top_key, index),
                    frame.finite(&self.cloud_top_key, index - 1),
                ) else {
                    return result;
                };
                if close > top && prev_close <= top_prev {
                    result.contributing.push("cloud_breakout_up");
                    result.strength += WEIGHT_PRIMARY;
                }
                if tenkan > kijun {
                    result.contributing.push("tenkan_above_kijun");
                    result.strength += WEIGHT_MOMENTUM;
                }
                if span_a > span_b {
                    result.contributing.push("bullish_cloud");
                    result.strength += WEIGHT_CONFIRM;
                }
                if close > kijun {
                    result.contributing.push("price_above_kijun");
                    result.strength += WEIGHT_CONFIRM;
                }
            }
            Direction::Short => {
                let (Some(bottom), Some(bottom_prev)) = (
                    frame.finite(&self.cloud_bottom_key, index),
                    frame.finite(&self.cloud_bottom_key, index - 1),
                ) else {
                    return result;
                };
                if close < bottom && prev_close >= bottom_prev {
                    result.contributing.push("cloud_breakout_down");
                    result.strength += WEIGHT_PRIMARY;
                }
                if tenkan < kijun {
                    result.contributing.push("tenkan_below_kijun");
                    result.strength += WEIGHT_MOMENTUM;
                }
                if span_a < span_b {
                    result.contributing.push("bearish_cloud");
                    result.strength += WEIGHT_CONFIRM;
                }
                if close < kijun {
                    result.contributing.push("price_below_kijun");
                    result.strength += WEIGHT_CONFIRM;
                }
            }
        }

        result.can_enter = result.strength >= self.signal_threshold;
        result
    }

    fn evaluate_exit(
        &self,
        bars: &[Bar],
        index: usize,
        frame: &IndicatorFrame,
        direction: Direction,
    ) -> ExitResult {
        let (Some(tenkan), Some(kijun)) = (
            frame.finite(&self.tenkan_key, index),
            frame.finite(&self.kijun_key, index),
        ) else {
            return ExitResult::hold();
        };
        let close = bars[index].close;

        match direction {
            Direction::Long => {
                let Some(top) = frame.finite(&self.cloud_top_key, index) else {
                    return ExitResult::hold();
                };
                if close < top {
                    ExitResult::exit(ExitReason::BaselineBreak, "close_back_inside_cloud")
                } else if tenkan < kijun {
                    ExitResult::exit(ExitReason::OppositeCross, "tenkan_below_kijun")
                } else if close < kijun {
                    ExitResult::exit(ExitReason::ReferenceBreach, "close_below_kijun")
                } else {
                    ExitResult::hold()
                }
            }
            Direction::Short => {
                let Some(bottom) = frame.finite(&self.cloud_bottom_key, index) else {
                    return ExitResult::hold();
                };
                if close > bottom {
                    ExitResult::exit(ExitReason::BaselineBreak, "close_back_inside_cloud")
                } else if tenkan > kijun {
                    ExitResult::exit(ExitReason::OppositeCross, "tenkan_above_kijun")
                } else if close > kijun {
                    ExitResult::exit(ExitReason::ReferenceBreach, "close_above_kijun")
                } else {
                    ExitResult::hold()
                }
            }
        }
    }
}
