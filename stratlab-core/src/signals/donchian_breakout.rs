//! Donchian channel breakout strategy.
//!
//! The primary condition is a close breaking the previous bar's channel
//! extreme. Channel position carries the momentum weight, and RSI direction
//! plus close-versus-middle confirm.

use crate::domain::{Bar, Direction, ExitReason};
use crate::indicators::{Donchian, DonchianBand, Indicator, IndicatorFrame, Rsi};

use super::{
    ExitResult, RegimeGate, SignalEvaluator, SignalResult, WEIGHT_CONFIRM, WEIGHT_MOMENTUM,
    WEIGHT_PRIMARY,
};

/// Channel-position quantile that marks the upper band zone for longs; the
/// mirror (1 - this) marks the lower zone for shorts.
const POSITION_BAND: f64 = 0.6;
/// Neutral RSI level used for momentum alignment and reversal exits.
const RSI_MIDLINE: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct DonchianBreakout {
    channel_period: usize,
    rsi_period: usize,
    gate: RegimeGate,
    signal_threshold: f64,
    upper_key: String,
    lower_key: String,
    middle_key: String,
    position_key: String,
    rsi_key: String,
}

impl DonchianBreakout {
    pub fn new(
        channel_period: usize,
        rsi_period: usize,
        gate: RegimeGate,
        signal_threshold: f64,
    ) -> Self {
        Self {
            channel_period,
            rsi_period,
            gate,
            signal_threshold,
            upper_key: format!("donchian_upper_{channel_period}"),
            lower_key: format!("donchian_lower_{channel_period}"),
            middle_key: format!("donchian_middle_{channel_period}"),
            position_key: format!("donchian_pos_{channel_period}"),
            rsi_key: format!("rsi_{rsi_period}"),
        }
    }
}

impl SignalEvaluator for DonchianBreakout {
    fn name(&self) -> &str {
        "donchian_breakout"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Donchian::new(self.channel_period, DonchianBand::Upper)),
            Box::new(Donchian::new(self.channel_period, DonchianBand::Lower)),
            Box::new(Donchian::new(self.channel_period, DonchianBand::Middle)),
            Box::new(Donchian::new(self.channel_period, DonchianBand::PricePosition)),
            Box::new(Rsi::new(self.rsi_period)),
            self.gate.indicator(),
        ]
    }

    fn warmup_bars(&self) -> usize {
        // +2 for the i-1/i-2 channel reads of the breakout event.
        (self.channel_period - 1)
            .max(self.rsi_period)
            .max(self.gate.lookback())
            + 2
    }

    fn evaluate_entry(
        &self,
        bars: &[Bar],
        index: usize,
        frame: &IndicatorFrame,
        direction: Direction,
    ) -> SignalResult {
        let mut result = SignalResult::none(direction);
        if index < 2 || !self.gate.permits(frame, index) {
            return result;
        }
        let (Some(middle), Some(position), Some(rsi)) = (
            frame.finite(&self.middle_key, index),
            frame.finite(&self.position_key, index),
            frame.finite(&self.rsi_key, index),
        ) else {
            return result;
        };
        let close = bars[index].close;
        let prev_close = bars[index - 1].close;

        match direction {
            Direction::Long => {
                // Break of the channel high that stood before this bar.
                let (Some(upper_prev), Some(upper_prev2)) = (
                    frame.finite(&self.upper_key, index - 1),
                    frame.finite(&self.upper_key, index - 2),
                ) else {
                    return result;
                };
                if close > upper_prev && prev_close <= upper_prev2 {
                    result.contributing.push("channel_breakout_up");
                    result.strength += WEIGHT_PRIMARY;
                }
                if position > POSITION_BAND {
                    result.contributing.push("upper_band_position");
                    result.strength += WEIGHT_MOMENTUM;
                }
                if rsi > RSI_MIDLINE {
                    result.contributing.push("rsi_bullish");
                    result.strength += WEIGHT_CONFIRM;
                }
                if close > middle {
                    result.contributing.push("close_above_middle");
                    result.strength += WEIGHT_CONFIRM;
                }
            }
            Direction::Short => {
                let (Some(lower_prev), Some(lower_prev2)) = (
                    frame.finite(&self.lower_key, index - 1),
                    frame.finite(&self.lower_key, index - 2),
                ) else {
                    return result;
                };
                if close < lower_prev && prev_close >= lower_prev2 {
                    result.contributing.push("channel_breakout_down");
                    result.strength += WEIGHT_PRIMARY;
                }
                if position < 1.0 - POSITION_BAND {
                    result.contributing.push("lower_band_position");
                    result.strength += WEIGHT_MOMENTUM;
                }
                if rsi < RSI_MIDLINE {
                    result.contributing.push("rsi_bearish");
                    result.strength += WEIGHT_CONFIRM;
                }
                if close < middle {
                    result.contributing.push("close_below_middle");
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
        if index < 1 {
            return ExitResult::hold();
        }
        let (Some(middle), Some(rsi), Some(rsi_prev)) = (
            frame.finite(&self.middle_key, index),
            frame.finite(&self.rsi_key, index),
            frame.finite(&self.rsi_key, index - 1),
        ) else {
            return ExitResult::hold();
        };
        let bar = &bars[index];

        match direction {
            Direction::Long => {
                let Some(lower_prev) = frame.finite(&self.lower_key, index - 1) else {
                    return ExitResult::hold();
                };
                if bar.close < middle {
                    ExitResult::exit(ExitReason::BaselineBreak, "close_below_middle")
                } else if bar.low <= lower_prev {
                    ExitResult::exit(ExitReason::ReferenceBreach, "lower_band_touch")
                } else if rsi < RSI_MIDLINE && rsi_prev >= RSI_MIDLINE {
                    ExitResult::exit(ExitReason::OppositeCross, "rsi_reversal_down")
                } else {
                    ExitResult::hold()
                }
            }
            Direction::Short => {
                let Some(upper_prev) = frame.finite(&self.upper_key, index - 1) else {
                    return ExitResult::hold();
                };
                if bar.close > middle {
                    ExitResult::exit(ExitReason::BaselineBreak, "close_above_middle")
                } else if bar.high >= upper_prev {
                    ExitResult::exit(ExitReason::ReferenceBreach, "upper_band_touch")
                } else if rsi > RSI_MIDLINE && rsi_prev <= RSI_MIDLINE {
                    ExitResult::exit(ExitReason::OppositeCross, "rsi_reversal_up")
                } else {
                    ExitResult::hold()
                }
            }
        }
    }
}
