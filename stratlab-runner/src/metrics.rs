//! Performance metrics — pure functions from a simulation result to scalars.
//!
//! Every metric is a pure function: equity curve and/or trade list in,
//! scalar out. No dependency on the data pipeline or the simulator itself.

use serde::{Deserialize, Serialize};

use stratlab_core::domain::{EquityPoint, Trade};
use stratlab_core::sim::SimResult;

/// Aggregate performance metrics for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// (final - initial) / initial.
    pub total_return: f64,
    /// Fraction of closed trades with positive gross P&L.
    pub win_rate: f64,
    /// Annualized Sharpe from per-bar equity returns; the annualization
    /// factor comes from the bar frequency of the equity curve.
    pub sharpe: f64,
    /// Peak-to-trough equity loss as a negative fraction.
    pub max_drawdown: f64,
    pub trade_count: usize,
}

impl PerformanceMetrics {
    pub fn from_result(result: &SimResult) -> Self {
        let equity: Vec<f64> = result.equity_curve.iter().map(|p| p.total_equity).collect();
        Self {
            total_return: result.total_return(),
            win_rate: win_rate(&result.trades),
            sharpe: sharpe_ratio(&equity, bars_per_year(&result.equity_curve)),
            max_drawdown: max_drawdown(&equity),
            trade_count: result.trades.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Bars per year inferred from the spacing of the first two equity points.
/// Falls back to daily bars when the curve is too short to measure.
pub fn bars_per_year(points: &[EquityPoint]) -> f64 {
    const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;
    if points.len() < 2 {
        return 365.0;
    }
    let interval = (points[1].timestamp - points[0].timestamp).num_seconds();
    if interval <= 0 {
        return 365.0;
    }
    SECONDS_PER_YEAR / interval as f64
}

/// Fraction of trades with positive gross P&L; 0.0 with no trades.
/// Partial exits count as trades, matching the ledger.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_win()).count() as f64 / trades.len() as f64
}

/// Annualized Sharpe ratio from per-bar equity returns.
///
/// Sharpe = mean(returns) / std(returns) * sqrt(bars_per_year).
/// Returns 0.0 if variance is zero or fewer than 3 equity points.
pub fn sharpe_ratio(equity_curve: &[f64], bars_per_year: f64) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * bars_per_year.sqrt()
}

/// Maximum drawdown as a negative fraction (-0.15 = 15% drawdown).
/// 0.0 for constant or monotonically rising equity.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use stratlab_core::domain::{Direction, ExitReason};

    fn point(hours: i64, equity: f64) -> EquityPoint {
        EquityPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::hours(hours),
            account_capital: equity,
            unrealized_pnl: 0.0,
            total_equity: equity,
        }
    }

    fn trade(pnl: f64) -> Trade {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        Trade {
            entry_time: t,
            exit_time: t + Duration::hours(4),
            direction: Direction::Long,
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            size: 1.0,
            realized_pnl: pnl,
            pnl_pct: pnl,
            exit_reason: ExitReason::OppositeCross,
            pyramid_legs_count: 0,
            holding_bars: 1,
        }
    }

    #[test]
    fn win_rate_counts_positive_pnl_only() {
        let trades = vec![trade(10.0), trade(-5.0), trade(0.0), trade(3.0)];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-12);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn max_drawdown_finds_deepest_trough() {
        let curve = [100.0, 120.0, 90.0, 110.0, 80.0];
        // Deepest: 120 -> 80.
        assert!((max_drawdown(&curve) - (80.0 / 120.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_zero_for_rising_equity() {
        assert_eq!(max_drawdown(&[100.0, 110.0, 120.0]), 0.0);
    }

    #[test]
    fn sharpe_zero_for_flat_equity() {
        assert_eq!(sharpe_ratio(&[100.0, 100.0, 100.0], 2190.0), 0.0);
    }

    #[test]
    fn sharpe_positive_for_uneven_gains() {
        let mut curve = vec![100.0];
        for i in 0..50 {
            let r = if i % 2 == 0 { 0.02 } else { 0.005 };
            curve.push(curve.last().unwrap() * (1.0 + r));
        }
        assert!(sharpe_ratio(&curve, 2190.0) > 0.0);
    }

    #[test]
    fn bars_per_year_from_four_hour_bars() {
        let points = vec![point(0, 100.0), point(4, 101.0)];
        let per_year = bars_per_year(&points);
        assert!((per_year - 365.25 * 6.0).abs() < 1.0);
    }
}
