//! Strategy parameters — the flat configuration bundle consumed by the
//! simulator, with fail-fast validation.
//!
//! Every knob is an `{opt: effect}` pair; nothing is silently clamped at
//! run time. `StrategyParams::validate()` rejects bad configurations at
//! construction with a descriptive error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration rejected at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be >= 1 (got {value})")]
    NonPositivePeriod { field: &'static str, value: usize },
    #[error("{field} must be positive (got {value})")]
    NonPositiveValue { field: &'static str, value: f64 },
    #[error("{field} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("kelly bounds inverted: min_fraction {min} > max_fraction {max}")]
    InvertedKellyBounds { min: f64, max: f64 },
    #[error("ladder rung {index}: profit thresholds must be strictly ascending")]
    LadderNotAscending { index: usize },
    #[error("ladder rung {index}: exit_fraction must be in (0, 1] (got {value})")]
    LadderFraction { index: usize, value: f64 },
    #[error("pyramid step {index}: profit gates must be strictly ascending")]
    PyramidNotAscending { index: usize },
    #[error("pyramid config: {gates} profit gates but {fractions} size fractions; need one fraction per gate")]
    PyramidShapeMismatch { gates: usize, fractions: usize },
    #[error("loss throttle step {index}: streak thresholds must be strictly descending with multipliers in (0, 1]")]
    ThrottleShape { index: usize },
    #[error("{field}: fast period {fast} must be < slow period {slow}")]
    PeriodOrder {
        field: &'static str,
        fast: usize,
        slow: usize,
    },
}

/// One rung of the partial-exit ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LadderSpec {
    /// Unleveraged profit threshold in percent points.
    pub profit_threshold_pct: f64,
    /// Fraction of the remaining position to close when the rung fires.
    pub exit_fraction: f64,
}

/// One step of the consecutive-loss throttle: at `streak` or more
/// consecutive losing trades, multiply the sized position by `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossThrottleStep {
    pub streak: u32,
    pub multiplier: f64,
}

/// Which signal evaluator drives entries/exits, with its periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    /// ZLHMA momentum + EMA golden/death cross confirmation.
    ZlhmaEmaCross {
        zlhma_period: usize,
        fast_ema_period: usize,
        slow_ema_period: usize,
    },
    /// Ichimoku cloud trend following.
    IchimokuTrend {
        tenkan_period: usize,
        kijun_period: usize,
        senkou_b_period: usize,
        cloud_shift: usize,
    },
    /// Donchian channel breakout with RSI confirmation.
    DonchianBreakout {
        channel_period: usize,
        rsi_period: usize,
    },
}

/// Flat strategy parameter bundle.
///
/// Two percent conventions coexist here: profit thresholds
/// (`ladder`, `pyramid_profit_gates_pct`, `trailing_activation_pct`) are
/// percent points (5.0 = 5%); cost and limit knobs (`slippage_pct`,
/// `commission_pct`, `stop_loss_pct`, `daily_loss_limit_pct`,
/// `trailing_distance_pct`) are fractions (0.02 = 2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub strategy: StrategySpec,

    /// Minimum summed signal weight required to enter.
    pub signal_threshold: f64,

    // ── Market regime filter ─────────────────────────────────────────
    /// ADX lookback for the trend-strength gate.
    pub adx_period: usize,
    /// Minimum trend strength required to permit entry (hard precondition).
    pub adx_threshold: f64,

    // ── Volatility reference ─────────────────────────────────────────
    pub atr_period: usize,

    // ── Costs and leverage ───────────────────────────────────────────
    /// Leverage multiple applied to the sized notional (1.0 = unleveraged).
    pub leverage: f64,
    /// Adverse price adjustment per fill, as a fraction of price.
    pub slippage_pct: f64,
    /// Commission per fill, proportional to notional traded.
    pub commission_pct: f64,

    // ── Kelly sizing ─────────────────────────────────────────────────
    /// Trailing closed-trade window used for the Kelly estimate.
    pub kelly_window: usize,
    /// Minimum closed trades before Kelly replaces the default fraction.
    pub kelly_min_trades: usize,
    /// Capital fraction used before the Kelly sample is large enough.
    pub default_fraction: f64,
    /// Fallback fraction when the sample has zero average loss.
    pub zero_loss_fraction: f64,
    /// Clamp band for the (half-)Kelly fraction.
    pub min_fraction: f64,
    pub max_fraction: f64,

    // ── Loss throttles ───────────────────────────────────────────────
    /// Step function of consecutive losing trades, highest streak first.
    pub loss_throttle: Vec<LossThrottleStep>,
    /// Fraction of initial capital lost in one day that suspends entries.
    pub daily_loss_limit_pct: f64,
    /// Cooldown after the daily breaker trips, in hours.
    pub suspension_hours: i64,

    // ── Stops ────────────────────────────────────────────────────────
    /// Percentage-of-entry initial stop (fraction).
    pub stop_loss_pct: f64,
    /// ATR multiple for the alternative initial stop; the tighter of the
    /// two stops is used.
    pub atr_stop_multiple: f64,
    /// Unleveraged profit (percent points) at which the trailing stop arms.
    pub trailing_activation_pct: f64,
    /// Distance of the trailing stop from the running extreme (fraction).
    pub trailing_distance_pct: f64,
    /// Profit locked by the initial trailing stop on activation (fraction
    /// of entry price).
    pub trailing_initial_lock_pct: f64,

    // ── Staged profit taking ─────────────────────────────────────────
    /// Ordered ladder, ascending thresholds. May be empty.
    pub ladder: Vec<LadderSpec>,

    // ── Pyramiding ───────────────────────────────────────────────────
    /// Maximum add-on legs (0 disables pyramiding).
    pub max_pyramid_legs: usize,
    /// Ascending unleveraged profit gates (percent points), one per leg.
    pub pyramid_profit_gates_pct: Vec<f64>,
    /// Leg notional as a fraction of the original entry notional, one per gate.
    pub pyramid_size_fractions: Vec<f64>,
}

impl StrategyParams {
    /// Stock ZLHMA 50/200 EMA cross configuration.
    pub fn zlhma_ema_defaults() -> Self {
        Self {
            strategy: StrategySpec::ZlhmaEmaCross {
                zlhma_period: 14,
                fast_ema_period: 50,
                slow_ema_period: 200,
            },
            signal_threshold: 2.5,
            adx_period: 14,
            adx_threshold: 25.0,
            atr_period: 14,
            leverage: 1.0,
            slippage_pct: 0.001,
            commission_pct: 0.0006,
            kelly_window: 100,
            kelly_min_trades: 20,
            default_fraction: 0.10,
            zero_loss_fraction: 0.15,
            min_fraction: 0.05,
            max_fraction: 0.20,
            loss_throttle: vec![
                LossThrottleStep { streak: 7, multiplier: 0.3 },
                LossThrottleStep { streak: 5, multiplier: 0.5 },
                LossThrottleStep { streak: 3, multiplier: 0.7 },
            ],
            daily_loss_limit_pct: 0.03,
            suspension_hours: 24,
            stop_loss_pct: 0.02,
            atr_stop_multiple: 1.5,
            trailing_activation_pct: 3.0,
            trailing_distance_pct: 0.10,
            trailing_initial_lock_pct: 0.01,
            ladder: vec![
                LadderSpec { profit_threshold_pct: 5.0, exit_fraction: 0.25 },
                LadderSpec { profit_threshold_pct: 10.0, exit_fraction: 0.35 },
                LadderSpec { profit_threshold_pct: 15.0, exit_fraction: 0.40 },
            ],
            max_pyramid_legs: 3,
            pyramid_profit_gates_pct: vec![3.0, 6.0, 9.0],
            pyramid_size_fractions: vec![0.75, 0.50, 0.25],
        }
    }

    /// Defaults of the Ichimoku cloud-breakout strategy. Risk settings are
    /// shared across strategies; only the signal layer differs.
    pub fn ichimoku_defaults() -> Self {
        Self {
            strategy: StrategySpec::IchimokuTrend {
                tenkan_period: 9,
                kijun_period: 26,
                senkou_b_period: 52,
                cloud_shift: 26,
            },
            ..Self::zlhma_ema_defaults()
        }
    }

    /// Defaults of the Donchian channel-breakout strategy.
    pub fn donchian_defaults() -> Self {
        Self {
            strategy: StrategySpec::DonchianBreakout {
                channel_period: 20,
                rsi_period: 14,
            },
            ..Self::zlhma_ema_defaults()
        }
    }

    /// Reject invalid configurations with a descriptive error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_strategy()?;

        check_period("adx_period", self.adx_period)?;
        check_period("atr_period", self.atr_period)?;
        check_positive("signal_threshold", self.signal_threshold)?;
        check_positive("leverage", self.leverage)?;
        check_fraction("slippage_pct", self.slippage_pct)?;
        check_fraction("commission_pct", self.commission_pct)?;

        check_period("kelly_window", self.kelly_window)?;
        check_unit_interval("default_fraction", self.default_fraction)?;
        check_unit_interval("zero_loss_fraction", self.zero_loss_fraction)?;
        check_unit_interval("min_fraction", self.min_fraction)?;
        check_unit_interval("max_fraction", self.max_fraction)?;
        if self.min_fraction > self.max_fraction {
            return Err(ConfigError::InvertedKellyBounds {
                min: self.min_fraction,
                max: self.max_fraction,
            });
        }

        for (i, pair) in self.loss_throttle.windows(2).enumerate() {
            if pair[1].streak >= pair[0].streak {
                return Err(ConfigError::ThrottleShape { index: i + 1 });
            }
        }
        for (i, step) in self.loss_throttle.iter().enumerate() {
            if step.multiplier <= 0.0 || step.multiplier > 1.0 || step.streak == 0 {
                return Err(ConfigError::ThrottleShape { index: i });
            }
        }

        check_unit_interval("daily_loss_limit_pct", self.daily_loss_limit_pct)?;
        if self.suspension_hours <= 0 {
            return Err(ConfigError::NonPositiveValue {
                field: "suspension_hours",
                value: self.suspension_hours as f64,
            });
        }

        check_unit_interval("stop_loss_pct", self.stop_loss_pct)?;
        check_positive("atr_stop_multiple", self.atr_stop_multiple)?;
        check_positive("trailing_activation_pct", self.trailing_activation_pct)?;
        check_unit_interval("trailing_distance_pct", self.trailing_distance_pct)?;
        check_fraction("trailing_initial_lock_pct", self.trailing_initial_lock_pct)?;

        for (i, rung) in self.ladder.iter().enumerate() {
            if rung.exit_fraction <= 0.0 || rung.exit_fraction > 1.0 {
                return Err(ConfigError::LadderFraction {
                    index: i,
                    value: rung.exit_fraction,
                });
            }
            if rung.profit_threshold_pct <= 0.0 {
                return Err(ConfigError::NonPositiveValue {
                    field: "ladder.profit_threshold_pct",
                    value: rung.profit_threshold_pct,
                });
            }
            if i > 0 && rung.profit_threshold_pct <= self.ladder[i - 1].profit_threshold_pct {
                return Err(ConfigError::LadderNotAscending { index: i });
            }
        }

        if self.max_pyramid_legs > 0 {
            if self.pyramid_profit_gates_pct.len() < self.max_pyramid_legs
                || self.pyramid_size_fractions.len() < self.max_pyramid_legs
            {
                return Err(ConfigError::PyramidShapeMismatch {
                    gates: self.pyramid_profit_gates_pct.len(),
                    fractions: self.pyramid_size_fractions.len(),
                });
            }
            for (i, pair) in self.pyramid_profit_gates_pct.windows(2).enumerate() {
                if pair[1] <= pair[0] {
                    return Err(ConfigError::PyramidNotAscending { index: i + 1 });
                }
            }
            for (i, &f) in self.pyramid_size_fractions.iter().enumerate() {
                if f <= 0.0 || f > 1.0 {
                    return Err(ConfigError::OutOfRange {
                        field: "pyramid_size_fractions",
                        value: f,
                        min: 0.0,
                        max: 1.0,
                    });
                }
                if self.pyramid_profit_gates_pct.get(i).copied().unwrap_or(1.0) <= 0.0 {
                    return Err(ConfigError::NonPositiveValue {
                        field: "pyramid_profit_gates_pct",
                        value: self.pyramid_profit_gates_pct[i],
                    });
                }
            }
        }

        Ok(())
    }

    fn validate_strategy(&self) -> Result<(), ConfigError> {
        match &self.strategy {
            StrategySpec::ZlhmaEmaCross {
                zlhma_period,
                fast_ema_period,
                slow_ema_period,
            } => {
                check_period("zlhma_period", *zlhma_period)?;
                check_period("fast_ema_period", *fast_ema_period)?;
                check_period("slow_ema_period", *slow_ema_period)?;
                // HMA sub-periods truncate to zero below 4.
                if *zlhma_period < 4 {
                    return Err(ConfigError::NonPositivePeriod {
                        field: "zlhma_period (minimum 4)",
                        value: *zlhma_period,
                    });
                }
                if fast_ema_period >= slow_ema_period {
                    return Err(ConfigError::PeriodOrder {
                        field: "ema periods",
                        fast: *fast_ema_period,
                        slow: *slow_ema_period,
                    });
                }
            }
            StrategySpec::IchimokuTrend {
                tenkan_period,
                kijun_period,
                senkou_b_period,
                cloud_shift,
            } => {
                check_period("tenkan_period", *tenkan_period)?;
                check_period("kijun_period", *kijun_period)?;
                check_period("senkou_b_period", *senkou_b_period)?;
                check_period("cloud_shift", *cloud_shift)?;
                if tenkan_period >= kijun_period {
                    return Err(ConfigError::PeriodOrder {
                        field: "ichimoku periods",
                        fast: *tenkan_period,
                        slow: *kijun_period,
                    });
                }
            }
            StrategySpec::DonchianBreakout {
                channel_period,
                rsi_period,
            } => {
                check_period("channel_period", *channel_period)?;
                check_period("rsi_period", *rsi_period)?;
            }
        }
        Ok(())
    }
}

fn check_period(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value < 1 {
        return Err(ConfigError::NonPositivePeriod { field, value });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(ConfigError::NonPositiveValue { field, value });
    }
    Ok(())
}

/// Fraction in [0, 1).
fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 || value >= 1.0 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

/// Fraction in (0, 1].
fn check_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(StrategyParams::zlhma_ema_defaults().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_kelly_bounds() {
        let mut p = StrategyParams::zlhma_ema_defaults();
        p.min_fraction = 0.3;
        p.max_fraction = 0.2;
        assert!(matches!(
            p.validate(),
            Err(ConfigError::InvertedKellyBounds { .. })
        ));
    }

    #[test]
    fn rejects_non_ascending_ladder() {
        let mut p = StrategyParams::zlhma_ema_defaults();
        p.ladder[1].profit_threshold_pct = 4.0;
        assert!(matches!(
            p.validate(),
            Err(ConfigError::LadderNotAscending { index: 1 })
        ));
    }

    #[test]
    fn rejects_ladder_fraction_above_one() {
        let mut p = StrategyParams::zlhma_ema_defaults();
        p.ladder[0].exit_fraction = 1.5;
        assert!(matches!(
            p.validate(),
            Err(ConfigError::LadderFraction { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_fast_slower_than_slow() {
        let mut p = StrategyParams::zlhma_ema_defaults();
        p.strategy = StrategySpec::ZlhmaEmaCross {
            zlhma_period: 14,
            fast_ema_period: 200,
            slow_ema_period: 50,
        };
        assert!(matches!(p.validate(), Err(ConfigError::PeriodOrder { .. })));
    }

    #[test]
    fn rejects_pyramid_shape_mismatch() {
        let mut p = StrategyParams::zlhma_ema_defaults();
        p.pyramid_size_fractions = vec![0.75];
        assert!(matches!(
            p.validate(),
            Err(ConfigError::PyramidShapeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_negative_slippage() {
        let mut p = StrategyParams::zlhma_ema_defaults();
        p.slippage_pct = -0.01;
        assert!(p.validate().is_err());
    }

    #[test]
    fn params_toml_roundtrip_via_json() {
        let p = StrategyParams::zlhma_ema_defaults();
        let json = serde_json::to_string(&p).unwrap();
        let back: StrategyParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
