//! Backtest simulation — engine, per-run state, and results.

pub mod engine;
pub mod state;

pub use engine::Simulator;
pub use state::SimulationState;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::{EquityPoint, Trade};

#[derive(Debug, Error)]
pub enum SimError {
    /// Fewer bars than the longest indicator warm-up requires.
    #[error("insufficient data: need at least {required} bars for warm-up, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("bar series timestamps are not strictly ascending")]
    UnorderedSeries,

    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything one simulator run produces.
///
/// The capital-conservation identity holds exactly:
/// `final_capital == initial_capital + Σ realized_pnl − total_commission`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_commission: f64,
    /// Bars skipped before the first evaluated bar.
    pub warmup_bars: usize,
    pub trades: Vec<Trade>,
    /// One point per evaluated bar, in bar order.
    pub equity_curve: Vec<EquityPoint>,
}

impl SimResult {
    /// Fractional return of the run on the account capital.
    pub fn total_return(&self) -> f64 {
        self.final_capital / self.initial_capital - 1.0
    }
}
