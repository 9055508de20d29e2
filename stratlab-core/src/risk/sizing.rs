//! Position sizing — Kelly estimation and the consecutive-loss throttle.

use crate::config::{LossThrottleStep, StrategyParams};

/// Closed-trade sample retained for the Kelly estimate. Partial exits
/// count as samples, not just terminal closes.
#[derive(Debug, Clone, Copy)]
pub struct TradeSample {
    /// Gross realized P&L, sign decides win/loss classification.
    pub pnl: f64,
    /// Unleveraged return in percent points.
    pub pnl_pct: f64,
}

/// Capital fraction from the half-Kelly criterion over recent trades.
///
/// Falls back to `default_fraction` while the sample is smaller than
/// `kelly_min_trades` or one-sided (all wins or all losses), and to
/// `zero_loss_fraction` when the losing trades average exactly zero.
/// The result is clamped to `[min_fraction, max_fraction]`.
pub fn kelly_fraction(samples: &[TradeSample], params: &StrategyParams) -> f64 {
    if samples.len() < params.kelly_min_trades {
        return params.default_fraction;
    }

    let wins: Vec<f64> = samples
        .iter()
        .filter(|s| s.pnl > 0.0)
        .map(|s| s.pnl_pct)
        .collect();
    let losses: Vec<f64> = samples
        .iter()
        .filter(|s| s.pnl <= 0.0)
        .map(|s| s.pnl_pct)
        .collect();
    if wins.is_empty() || losses.is_empty() {
        return params.default_fraction;
    }

    let avg_win = wins.iter().sum::<f64>() / wins.len() as f64;
    let avg_loss = (losses.iter().sum::<f64>() / losses.len() as f64).abs();
    if avg_loss == 0.0 {
        return params.zero_loss_fraction;
    }

    let b = avg_win / avg_loss;
    let p = wins.len() as f64 / samples.len() as f64;
    let q = 1.0 - p;

    let half_kelly = (p * b - q) / b * 0.5;
    half_kelly.clamp(params.min_fraction, params.max_fraction)
}

/// Step-function size multiplier for a consecutive-loss streak.
///
/// `steps` must be ordered highest streak first; the first step whose
/// streak is reached applies. Resets to 1.0 below every step.
pub fn throttle_multiplier(consecutive_losses: u32, steps: &[LossThrottleStep]) -> f64 {
    steps
        .iter()
        .find(|s| consecutive_losses >= s.streak)
        .map(|s| s.multiplier)
        .unwrap_or(1.0)
}
