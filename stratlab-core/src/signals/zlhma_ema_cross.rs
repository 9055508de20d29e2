//! ZLHMA + EMA cross strategy.
//!
//! The primary condition is an EMA golden/death cross of the fast and slow
//! EMAs. A two-bar ZLHMA momentum run aligns the zero-lag average with the
//! cross, and two half-weight confirmations check price location relative
//! to the ZLHMA and to both EMAs.

use crate::domain::{Bar, Direction, ExitReason};
use crate::indicators::{Ema, Indicator, IndicatorFrame, Zlhma};

use super::{
    ExitResult, RegimeGate, SignalEvaluator, SignalResult, WEIGHT_CONFIRM, WEIGHT_MOMENTUM,
    WEIGHT_PRIMARY,
};

/// Fraction beyond the fast EMA that counts as a strong break.
const FAST_EMA_BREAK_PCT: f64 = 0.02;

#[derive(Debug, Clone)]
pub struct ZlhmaEmaCross {
    zlhma_period: usize,
    fast_ema_period: usize,
    slow_ema_period: usize,
    gate: RegimeGate,
    signal_threshold: f64,
    zlhma_key: String,
    fast_key: String,
    slow_key: String,
}

impl ZlhmaEmaCross {
    pub fn new(
        zlhma_period: usize,
        fast_ema_period: usize,
        slow_ema_period: usize,
        gate: RegimeGate,
        signal_threshold: f64,
    ) -> Self {
        assert!(
            fast_ema_period < slow_ema_period,
            "fast EMA period must be shorter than slow"
        );
        Self {
            zlhma_period,
            fast_ema_period,
            slow_ema_period,
            gate,
            signal_threshold,
            zlhma_key: format!("zlhma_{zlhma_period}"),
            fast_key: format!("ema_{fast_ema_period}"),
            slow_key: format!("ema_{slow_ema_period}"),
        }
    }

    /// All series an evaluation reads, `None` when any is still warming up.
    #[allow(clippy::type_complexity)]
    fn read(
        &self,
        frame: &IndicatorFrame,
        index: usize,
    ) -> Option<(f64, f64, f64, f64, f64, f64, f64)> {
        if index < 2 {
            return None;
        }
        Some((
            frame.finite(&self.zlhma_key, index)?,
            frame.finite(&self.zlhma_key, index - 1)?,
            frame.finite(&self.zlhma_key, index - 2)?,
            frame.finite(&self.fast_key, index)?,
            frame.finite(&self.slow_key, index)?,
            frame.finite(&self.fast_key, index - 1)?,
            frame.finite(&self.slow_key, index - 1)?,
        ))
    }
}

impl SignalEvaluator for ZlhmaEmaCross {
    fn name(&self) -> &str {
        "zlhma_ema_cross"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Zlhma::new(self.zlhma_period)),
            Box::new(Ema::new(self.fast_ema_period)),
            Box::new(Ema::new(self.slow_ema_period)),
            self.gate.indicator(),
        ]
    }

    fn warmup_bars(&self) -> usize {
        let zlhma = Zlhma::new(self.zlhma_period).lookback();
        let slow = self.slow_ema_period - 1;
        // +2 for the two-bar momentum and previous-bar cross reads.
        zlhma.max(slow).max(self.gate.lookback()) + 2
    }

    fn evaluate_entry(
        &self,
        bars: &[Bar],
        index: usize,
        frame: &IndicatorFrame,
        direction: Direction,
    ) -> SignalResult {
        let mut result = SignalResult::none(direction);
        if !self.gate.permits(frame, index) {
            return result;
        }
        let Some((zlhma, zlhma_p1, zlhma_p2, fast, slow, fast_p1, slow_p1)) =
            self.read(frame, index)
        else {
            return result;
        };
        let close = bars[index].close;

        match direction {
            Direction::Long => {
                if fast > slow && fast_p1 <= slow_p1 {
                    result.contributing.push("ema_golden_cross");
                    result.strength += WEIGHT_PRIMARY;
                }
                if zlhma > zlhma_p1 && zlhma_p1 > zlhma_p2 {
                    result.contributing.push("zlhma_upward_momentum");
                    result.strength += WEIGHT_MOMENTUM;
                }
                if close > zlhma {
                    result.contributing.push("price_above_zlhma");
                    result.strength += WEIGHT_CONFIRM;
                }
                if close > fast && close > slow {
                    result.contributing.push("price_above_emas");
                    result.strength += WEIGHT_CONFIRM;
                }
            }
            Direction::Short => {
                if fast < slow && fast_p1 >= slow_p1 {
                    result.contributing.push("ema_death_cross");
                    result.strength += WEIGHT_PRIMARY;
                }
                if zlhma < zlhma_p1 && zlhma_p1 < zlhma_p2 {
                    result.contributing.push("zlhma_downward_momentum");
                    result.strength += WEIGHT_MOMENTUM;
                }
                if close < zlhma {
                    result.contributing.push("price_below_zlhma");
                    result.strength += WEIGHT_CONFIRM;
                }
                if close < fast && close < slow {
                    result.contributing.push("price_below_emas");
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
        let (Some(zlhma), Some(fast), Some(slow)) = (
            frame.finite(&self.zlhma_key, index),
            frame.finite(&self.fast_key, index),
            frame.finite(&self.slow_key, index),
        ) else {
            return ExitResult::hold();
        };
        let bar = &bars[index];

        match direction {
            Direction::Long => {
                if fast < slow {
                    ExitResult::exit(ExitReason::OppositeCross, "ema_death_cross")
                } else if bar.close < zlhma {
                    ExitResult::exit(ExitReason::BaselineBreak, "close_below_zlhma")
                } else if bar.low < fast * (1.0 - FAST_EMA_BREAK_PCT) {
                    ExitResult::exit(ExitReason::ReferenceBreach, "strong_break_below_fast_ema")
                } else {
                    ExitResult::hold()
                }
            }
            Direction::Short => {
                if fast > slow {
                    ExitResult::exit(ExitReason::OppositeCross, "ema_golden_cross")
                } else if bar.close > zlhma {
                    ExitResult::exit(ExitReason::BaselineBreak, "close_above_zlhma")
                } else if bar.high > fast * (1.0 + FAST_EMA_BREAK_PCT) {
                    ExitResult::exit(ExitReason::ReferenceBreach, "strong_break_above_fast_ema")
                } else {
                    ExitResult::hold()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn tiny_eval() -> ZlhmaEmaCross {
        // Threshold 2.5 requires the cross plus at least one confirmation.
        ZlhmaEmaCross::new(4, 3, 6, RegimeGate::new(3, 0.0), 2.5)
    }

    fn frame_for(eval: &ZlhmaEmaCross, bars: &[crate::domain::Bar]) -> IndicatorFrame {
        IndicatorFrame::build(&eval.indicators(), bars)
    }

    #[test]
    fn golden_cross_after_v_bottom_enters_long() {
        // Decline long enough to put the fast EMA below the slow one, then a
        // sharp recovery forcing a single golden cross.
        let mut closes: Vec<f64> = (0..20).map(|i| 120.0 - 2.0 * i as f64).collect();
        closes.extend((0..20).map(|i| 82.0 + 5.0 * i as f64));
        let bars = make_bars(&closes);
        let eval = tiny_eval();
        let frame = frame_for(&eval, &bars);

        let mut entries = 0;
        for i in eval.warmup_bars()..bars.len() {
            let long = eval.evaluate_entry(&bars, i, &frame, Direction::Long);
            if long.can_enter {
                assert!(long.contributing.contains(&"ema_golden_cross"));
                assert!(long.strength >= 2.5);
                entries += 1;
            }
        }
        assert_eq!(entries, 1);
    }

    #[test]
    fn no_entry_without_primary_cross() {
        // Steady uptrend: confirmations hold every bar but the cross fired
        // before warm-up completed, so strength never reaches threshold.
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + 1.5 * i as f64).collect();
        let bars = make_bars(&closes);
        let eval = tiny_eval();
        let frame = frame_for(&eval, &bars);

        for i in eval.warmup_bars() + 5..bars.len() {
            let long = eval.evaluate_entry(&bars, i, &frame, Direction::Long);
            assert!(!long.can_enter, "unexpected entry at bar {i}");
            assert!(long.strength <= 2.0);
        }
    }

    #[test]
    fn long_exit_on_death_cross() {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        closes.extend((0..20).map(|i| 138.0 - 4.0 * i as f64));
        let bars = make_bars(&closes);
        let eval = tiny_eval();
        let frame = frame_for(&eval, &bars);

        let exit = eval.evaluate_exit(&bars, bars.len() - 1, &frame, Direction::Long);
        assert!(exit.should_exit);
        assert_eq!(exit.reason, Some(ExitReason::OppositeCross));
    }

    #[test]
    fn warmup_reads_are_held_not_coerced() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let eval = tiny_eval();
        let frame = frame_for(&eval, &bars);

        for i in 0..eval.warmup_bars() {
            let entry = eval.evaluate_entry(&bars, i, &frame, Direction::Long);
            assert!(!entry.can_enter);
        }
    }
}
