//! Domain types: bars, positions, trades, equity points.

pub mod bar;
pub mod equity;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use equity::EquityPoint;
pub use position::{leg_return, Direction, LadderRung, Position, PyramidLeg};
pub use trade::{ExitReason, Trade};
