//! Backtest simulator — the single forward pass over a bar series.
//!
//! Per-bar order is fixed so results are reproducible:
//!
//! 1. refresh the ATR reference
//! 2. advance the daily-loss breaker
//! 3. with a position open: update extremes, fire at most one partial-exit
//!    rung, check stop/trailing against the bar's high/low, check the
//!    signal exit, then pyramiding
//! 4. flat and not suspended: evaluate entries, long before short
//! 5. record one equity point
//!
//! Any open position left at the end of the series is force-closed at the
//! final close price.

use crate::config::StrategyParams;
use crate::domain::{bar::is_strictly_ordered, Bar, Direction, ExitReason};
use crate::indicators::{Atr, Indicator, IndicatorFrame};
use crate::risk::RiskManager;
use crate::signals::build_evaluator;

use super::state::SimulationState;
use super::{SimError, SimResult};

pub struct Simulator {
    params: StrategyParams,
    initial_capital: f64,
}

impl Simulator {
    /// Validate the configuration up front; invalid parameters fail here,
    /// never mid-run.
    pub fn new(params: StrategyParams, initial_capital: f64) -> Result<Self, SimError> {
        params.validate()?;
        if !(initial_capital > 0.0) {
            return Err(SimError::NonPositiveCapital(initial_capital));
        }
        Ok(Self {
            params,
            initial_capital,
        })
    }

    /// Bars consumed by indicator warm-up before the first evaluated bar.
    pub fn warmup_bars(&self) -> usize {
        let evaluator = build_evaluator(&self.params);
        evaluator
            .warmup_bars()
            .max(Atr::new(self.params.atr_period).lookback())
    }

    /// Run one full simulation over `bars`.
    pub fn run(&self, bars: &[Bar]) -> Result<SimResult, SimError> {
        let warmup = self.warmup_bars();
        if bars.len() <= warmup {
            return Err(SimError::InsufficientData {
                required: warmup + 1,
                available: bars.len(),
            });
        }
        if !is_strictly_ordered(bars) {
            return Err(SimError::UnorderedSeries);
        }

        let evaluator = build_evaluator(&self.params);
        let atr = Atr::new(self.params.atr_period);
        let atr_key = atr.name().to_owned();
        let mut indicators = evaluator.indicators();
        indicators.push(Box::new(atr));
        let frame = IndicatorFrame::build(&indicators, bars);

        let mut state =
            SimulationState::new(RiskManager::new(self.params.clone(), self.initial_capital));

        for (i, bar) in bars.iter().enumerate().skip(warmup) {
            state.current_atr = frame.finite(&atr_key, i);
            let suspended = state.risk.entries_blocked(bar.timestamp);

            if state.risk.has_position() {
                state.risk.check_partial_exits(bar, i);

                if let Some(hit) = state.risk.check_stops(bar) {
                    state.risk.close_position(hit.price, bar.timestamp, i, hit.reason);
                } else if let Some(pos) = state.risk.position() {
                    let direction = pos.direction;
                    let exit = evaluator.evaluate_exit(bars, i, &frame, direction);
                    if let (true, Some(reason)) = (exit.should_exit, exit.reason) {
                        state.risk.close_position(bar.close, bar.timestamp, i, reason);
                    } else {
                        state.risk.try_pyramid(bar, i);
                    }
                }
            } else if !suspended {
                // Long is evaluated first; the first qualifying direction
                // wins the bar.
                let long = evaluator.evaluate_entry(bars, i, &frame, Direction::Long);
                if long.can_enter {
                    state.risk.open_position(
                        Direction::Long,
                        bar.close,
                        bar.timestamp,
                        i,
                        state.current_atr,
                    );
                } else {
                    let short = evaluator.evaluate_entry(bars, i, &frame, Direction::Short);
                    if short.can_enter {
                        state.risk.open_position(
                            Direction::Short,
                            bar.close,
                            bar.timestamp,
                            i,
                            state.current_atr,
                        );
                    }
                }
            }

            state.record_equity(bar);
        }

        if state.risk.has_position() {
            let last = bars.len() - 1;
            state.risk.close_position(
                bars[last].close,
                bars[last].timestamp,
                last,
                ExitReason::EndOfData,
            );
        }

        Ok(SimResult {
            initial_capital: self.initial_capital,
            final_capital: state.risk.capital(),
            total_commission: state.risk.total_commission(),
            warmup_bars: warmup,
            trades: state.risk.into_trades(),
            equity_curve: state.equity_curve,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategySpec;
    use crate::indicators::make_bars;

    fn small_params() -> StrategyParams {
        let mut p = StrategyParams::zlhma_ema_defaults();
        p.strategy = StrategySpec::ZlhmaEmaCross {
            zlhma_period: 4,
            fast_ema_period: 3,
            slow_ema_period: 6,
        };
        p.adx_period = 3;
        p.adx_threshold = 0.0;
        p.atr_period = 3;
        p
    }

    #[test]
    fn construction_rejects_bad_config() {
        let mut p = small_params();
        p.signal_threshold = -1.0;
        assert!(Simulator::new(p, 10_000.0).is_err());
        assert!(Simulator::new(small_params(), 0.0).is_err());
    }

    #[test]
    fn too_few_bars_is_insufficient_data() {
        let sim = Simulator::new(small_params(), 10_000.0).unwrap();
        let bars = make_bars(&[100.0; 5]);
        match sim.run(&bars) {
            Err(SimError::InsufficientData { required, available }) => {
                assert!(required > available);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn unordered_series_is_rejected() {
        let sim = Simulator::new(small_params(), 10_000.0).unwrap();
        let mut bars = make_bars(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        bars.swap(30, 31);
        assert!(matches!(sim.run(&bars), Err(SimError::UnorderedSeries)));
    }

    #[test]
    fn equity_curve_covers_every_simulated_bar() {
        let sim = Simulator::new(small_params(), 10_000.0).unwrap();
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.35).sin() * 6.0 + i as f64 * 0.1)
            .collect();
        let bars = make_bars(&closes);
        let result = sim.run(&bars).unwrap();
        assert_eq!(result.equity_curve.len(), bars.len() - result.warmup_bars);
    }
}
