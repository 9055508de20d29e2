//! Position & risk management — sizing, stops, throttles, capital.

pub mod breaker;
pub mod manager;
pub mod sizing;

pub use breaker::DailyLossBreaker;
pub use manager::{RiskManager, StopHit};
pub use sizing::{kelly_fraction, throttle_multiplier, TradeSample};
