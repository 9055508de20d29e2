//! StratLab Runner — run configuration, bar loading, metrics, walk-forward.
//!
//! This crate builds on `stratlab-core` to provide:
//! - CSV bar loading with strict ordering checks
//! - TOML run configuration with a BLAKE3 run fingerprint
//! - Performance metrics (return, win rate, Sharpe, drawdown)
//! - The walk-forward harness: rolling train/test windows, rayon-parallel,
//!   deterministic window-ordered reports

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod walk_forward;

pub use config::{RunConfig, RunConfigError, RunId};
pub use data_loader::{load_bars, read_bars, LoadError};
pub use metrics::PerformanceMetrics;
pub use walk_forward::{
    run_walk_forward, AggregateReport, SkippedWindow, WalkForwardError, WalkForwardReport,
    WindowRange, WindowReport, WindowSpec,
};
