//! Position — the single mutable trading position of a simulation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Sign of favorable price movement: +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// One rung of the staged profit-taking ladder. Fires at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderRung {
    /// Unleveraged profit threshold in percent points (5.0 = +5%).
    pub profit_threshold_pct: f64,
    /// Fraction of the *currently remaining* main position to close.
    pub exit_fraction: f64,
    pub done: bool,
}

/// A pyramided add-on entry. Shares the parent position's direction and
/// stop/exit logic; legs are only ever added, never resized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PyramidLeg {
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_index: usize,
    pub notional_value: f64,
    pub leveraged_value: f64,
    pub share_count: f64,
}

/// The open position of one simulated account (at most one at a time).
///
/// Mutated in place by partial exits, pyramid additions, and stop/trailing
/// updates; destroyed on full close. `share_count` and `notional_value`
/// only decrease (partial exits); the direction never changes without a
/// full close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_index: usize,
    /// Capital committed, pre-leverage.
    pub notional_value: f64,
    pub leveraged_value: f64,
    pub share_count: f64,
    /// Initial stop. Fixed at entry; superseded by the trailing stop once active.
    pub stop_price: f64,
    pub trailing_active: bool,
    pub trailing_stop_price: Option<f64>,
    /// Running favorable extreme since entry (highest high for longs,
    /// lowest low for shorts).
    pub trailing_reference_price: f64,
    pub ladder: Vec<LadderRung>,
    pub pyramid_legs: Vec<PyramidLeg>,
    /// Notional at entry, before any partial exit. Pyramid leg sizes are
    /// fractions of this.
    pub original_notional: f64,
}

impl Position {
    /// Unleveraged fractional return of the main entry at `price`.
    ///
    /// Short returns use the `entry/price - 1` convention of the source
    /// system; changing it would silently alter backtest results.
    pub fn unleveraged_return(&self, price: f64) -> f64 {
        leg_return(self.direction, self.entry_price, price)
    }

    /// Unleveraged return in percent points (5.0 = +5%).
    pub fn profit_pct(&self, price: f64) -> f64 {
        self.unleveraged_return(price) * 100.0
    }

    /// Update the running favorable extreme from an intrabar high/low.
    pub fn update_extreme(&mut self, high: f64, low: f64) {
        match self.direction {
            Direction::Long => {
                if high > self.trailing_reference_price {
                    self.trailing_reference_price = high;
                }
            }
            Direction::Short => {
                if low < self.trailing_reference_price {
                    self.trailing_reference_price = low;
                }
            }
        }
    }

    /// Number of pyramid legs currently attached.
    pub fn pyramid_count(&self) -> usize {
        self.pyramid_legs.len()
    }
}

/// Unleveraged fractional return for one leg entered at `entry`.
pub fn leg_return(direction: Direction, entry: f64, price: f64) -> f64 {
    match direction {
        Direction::Long => price / entry - 1.0,
        Direction::Short => entry / price - 1.0,
    }
}
