//! StratLab Core — deterministic strategy simulation engine.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, positions, trades, equity points)
//! - Pure indicator library with explicit NaN warm-up
//! - Weighted signal evaluators behind one polymorphic trait
//! - Position & risk manager (Kelly sizing, stops, partial exits,
//!   pyramiding, loss throttles, daily circuit breaker)
//! - Bar-by-bar backtest simulator with fixed per-bar precedence
//!
//! Data flows one way: bars → indicators → signals → position mutation →
//! trade/equity records. The crate does no I/O; bar series arrive in full
//! from the caller.

pub mod config;
pub mod domain;
pub mod indicators;
pub mod risk;
pub mod signals;
pub mod sim;
