//! Equity curve points — one per simulated bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account snapshot at one bar. Recorded for every bar of the run,
/// including bars with no open position (`unrealized_pnl = 0`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// Realized capital.
    pub account_capital: f64,
    /// Mark-to-market P&L of the open position and its pyramid legs.
    pub unrealized_pnl: f64,
    /// `account_capital + unrealized_pnl`.
    pub total_equity: f64,
}
