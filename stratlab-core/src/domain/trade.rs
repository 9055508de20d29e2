//! Trade records — the append-only ledger of realized closes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Direction;

/// Why a (partial or full) close happened. Closed set; never silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Fast/slow reference lines crossed against the position
    /// (EMA death/golden cross, Tenkan/Kijun cross, middle-band cross).
    OppositeCross,
    /// Price broke the strategy's baseline (ZLHMA, cloud edge, channel middle).
    BaselineBreak,
    /// Hard breach of the secondary reference (fast-EMA band, Kijun touch,
    /// opposite channel band).
    ReferenceBreach,
    /// Initial stop hit intrabar.
    StopLoss,
    /// Trailing stop hit intrabar.
    TrailingStop,
    /// Staged profit-taking rung fired (0-based rung index).
    PartialExit { rung: usize },
    /// Forced close at the final bar of the series.
    EndOfData,
}

impl ExitReason {
    pub fn is_partial(&self) -> bool {
        matches!(self, ExitReason::PartialExit { .. })
    }
}

/// Immutable ledger entry, produced exactly once per full or partial close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Shares closed by this record.
    pub size: f64,
    /// Gross price P&L. Commissions are accounted separately so the
    /// capital-conservation identity holds exactly.
    pub realized_pnl: f64,
    /// Unleveraged return in percent points (used for Kelly estimation).
    pub pnl_pct: f64,
    pub exit_reason: ExitReason,
    /// Pyramid legs attached at close time.
    pub pyramid_legs_count: usize,
    /// Bars held from entry to this close.
    pub holding_bars: usize,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.realized_pnl > 0.0
    }
}
