//! Per-run simulation state.
//!
//! One `SimulationState` exists per simulator run and is never shared:
//! independent runs (e.g. walk-forward windows) each own their capital,
//! position, ledgers, and equity curve, which is what makes cross-window
//! parallelism safe.

use crate::domain::{Bar, EquityPoint};
use crate::risk::RiskManager;

#[derive(Debug)]
pub struct SimulationState {
    pub risk: RiskManager,
    pub equity_curve: Vec<EquityPoint>,
    /// Latest finite ATR reading, refreshed every bar before any decision.
    pub current_atr: Option<f64>,
}

impl SimulationState {
    pub fn new(risk: RiskManager) -> Self {
        Self {
            risk,
            equity_curve: Vec::new(),
            current_atr: None,
        }
    }

    /// Append the equity point for `bar`. Called exactly once per
    /// simulated bar, position or no position.
    pub fn record_equity(&mut self, bar: &Bar) {
        let account_capital = self.risk.capital();
        let unrealized_pnl = self.risk.unrealized_pnl(bar.close);
        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            account_capital,
            unrealized_pnl,
            total_equity: account_capital + unrealized_pnl,
        });
    }
}
