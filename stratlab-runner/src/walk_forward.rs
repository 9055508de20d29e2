//! Walk-forward validation harness.
//!
//! Slides a fixed train/test window pair across the bar history and runs
//! two independent simulations per window with identical parameters and
//! fresh state. No re-optimization happens per window; the harness only
//! measures how one fixed parameter set degrades out of sample.
//!
//! The test run is fed `lookback_buffer + test_span` bars rather than the
//! full history, so indicator warm-up for the test span cannot absorb data
//! from beyond the window. Windows run in parallel with rayon; reports are
//! collected in window order, so output is deterministic.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RunConfig;
use crate::metrics::PerformanceMetrics;
use stratlab_core::domain::Bar;
use stratlab_core::sim::Simulator;

/// Weight of the Sharpe gap in the overfitting score. Return gaps are
/// fractions near zero while Sharpe gaps span several units, so the gap
/// is scaled down to keep both terms comparable.
const SHARPE_GAP_SCALE: f64 = 0.1;

/// Efficiency ratios are not reported when the training return is this
/// close to zero.
const MIN_TRAIN_RETURN: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("invalid window spec: {reason}")]
    BadWindowSpec { reason: &'static str },

    #[error("bar history ({available} bars) is shorter than one window ({required})")]
    HistoryTooShort { required: usize, available: usize },

    #[error(transparent)]
    Sim(#[from] stratlab_core::sim::SimError),
}

/// Window layout: spans and step are in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub train_span: usize,
    pub test_span: usize,
    /// Distance between consecutive window starts.
    pub step: usize,
    /// Extra bars fed to the test run before its span, covering indicator
    /// warm-up. Must be at least the simulator's warm-up requirement or
    /// every test run is skipped as insufficient.
    pub lookback_buffer: usize,
}

impl WindowSpec {
    pub fn validate(&self) -> Result<(), WalkForwardError> {
        if self.train_span == 0 || self.test_span == 0 {
            return Err(WalkForwardError::BadWindowSpec {
                reason: "train_span and test_span must be positive",
            });
        }
        if self.step == 0 {
            return Err(WalkForwardError::BadWindowSpec {
                reason: "step must be positive",
            });
        }
        Ok(())
    }

    /// Bars required for the first window.
    pub fn min_bars(&self) -> usize {
        self.train_span + self.test_span
    }
}

/// Bar-index ranges of one window (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRange {
    pub start: usize,
    pub end: usize,
}

/// Scored result of one train/test window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub window_id: usize,
    pub train_range: WindowRange,
    pub test_range: WindowRange,
    pub train: PerformanceMetrics,
    pub test: PerformanceMetrics,
    /// test return / train return; `None` when the training return is too
    /// close to zero to divide by.
    pub efficiency_ratio: Option<f64>,
    /// |return gap| + scaled |Sharpe gap|; lower is better.
    pub overfitting_score: f64,
    /// Both training and test returns positive.
    pub consistent: bool,
}

/// A window whose simulation could not run. Recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedWindow {
    pub window_id: usize,
    pub reason: String,
}

/// Cross-window summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub window_count: usize,
    pub skipped_count: usize,
    pub mean_test_return: f64,
    pub stdev_test_return: f64,
    /// Fraction of scored windows with positive test return.
    pub fraction_positive: f64,
    pub fraction_consistent: f64,
    /// Mean over windows where the ratio was defined.
    pub mean_efficiency_ratio: Option<f64>,
    pub mean_overfitting_score: f64,
}

/// Full harness output: per-window reports in window order, skipped
/// windows, and the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub run_id: String,
    pub windows: Vec<WindowReport>,
    pub skipped: Vec<SkippedWindow>,
    pub aggregate: AggregateReport,
}

/// Run the full walk-forward analysis over a bar history.
pub fn run_walk_forward(
    config: &RunConfig,
    bars: &[Bar],
) -> Result<WalkForwardReport, WalkForwardError> {
    let spec = config.walk_forward;
    spec.validate()?;
    if bars.len() < spec.min_bars() {
        return Err(WalkForwardError::HistoryTooShort {
            required: spec.min_bars(),
            available: bars.len(),
        });
    }

    let simulator = Simulator::new(config.params.clone(), config.initial_capital)?;
    let layouts = generate_windows(&spec, bars.len());

    let outcomes: Vec<Result<WindowReport, SkippedWindow>> = layouts
        .par_iter()
        .map(|layout| run_window(&simulator, bars, layout))
        .collect();

    let mut windows = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(report) => windows.push(report),
            Err(skip) => skipped.push(skip),
        }
    }

    let aggregate = aggregate(&windows, skipped.len());
    Ok(WalkForwardReport {
        run_id: config.run_id(),
        windows,
        skipped,
        aggregate,
    })
}

/// Internal window layout before simulation.
#[derive(Debug, Clone, Copy)]
struct WindowLayout {
    window_id: usize,
    train: WindowRange,
    test: WindowRange,
    /// Start of the bar slice fed to the test run (test start minus the
    /// lookback buffer, clamped to the history start).
    test_feed_start: usize,
}

fn generate_windows(spec: &WindowSpec, total_bars: usize) -> Vec<WindowLayout> {
    let mut layouts = Vec::new();
    let mut window_id = 0;
    loop {
        let train_start = window_id * spec.step;
        let train_end = train_start + spec.train_span;
        let test_end = train_end + spec.test_span;
        if test_end > total_bars {
            break;
        }
        layouts.push(WindowLayout {
            window_id,
            train: WindowRange {
                start: train_start,
                end: train_end,
            },
            test: WindowRange {
                start: train_end,
                end: test_end,
            },
            test_feed_start: train_end.saturating_sub(spec.lookback_buffer),
        });
        window_id += 1;
    }
    layouts
}

fn run_window(
    simulator: &Simulator,
    bars: &[Bar],
    layout: &WindowLayout,
) -> Result<WindowReport, SkippedWindow> {
    let skip = |reason: String| SkippedWindow {
        window_id: layout.window_id,
        reason,
    };

    let train_result = simulator
        .run(&bars[layout.train.start..layout.train.end])
        .map_err(|e| skip(format!("train run failed: {e}")))?;
    let test_result = simulator
        .run(&bars[layout.test_feed_start..layout.test.end])
        .map_err(|e| skip(format!("test run failed: {e}")))?;

    let train = PerformanceMetrics::from_result(&train_result);
    let test = PerformanceMetrics::from_result(&test_result);
    Ok(score_window(layout, train, test))
}

fn score_window(
    layout: &WindowLayout,
    train: PerformanceMetrics,
    test: PerformanceMetrics,
) -> WindowReport {
    let efficiency_ratio = if train.total_return.abs() < MIN_TRAIN_RETURN {
        None
    } else {
        Some(test.total_return / train.total_return)
    };
    let overfitting_score = (train.total_return - test.total_return).abs()
        + SHARPE_GAP_SCALE * (train.sharpe - test.sharpe).abs();
    let consistent = train.total_return > 0.0 && test.total_return > 0.0;

    WindowReport {
        window_id: layout.window_id,
        train_range: layout.train,
        test_range: layout.test,
        train,
        test,
        efficiency_ratio,
        overfitting_score,
        consistent,
    }
}

fn aggregate(windows: &[WindowReport], skipped_count: usize) -> AggregateReport {
    let n = windows.len();
    if n == 0 {
        return AggregateReport {
            window_count: 0,
            skipped_count,
            mean_test_return: 0.0,
            stdev_test_return: 0.0,
            fraction_positive: 0.0,
            fraction_consistent: 0.0,
            mean_efficiency_ratio: None,
            mean_overfitting_score: 0.0,
        };
    }

    let test_returns: Vec<f64> = windows.iter().map(|w| w.test.total_return).collect();
    let mean_test = test_returns.iter().sum::<f64>() / n as f64;
    let var = test_returns
        .iter()
        .map(|r| (r - mean_test) * (r - mean_test))
        .sum::<f64>()
        / n as f64;

    let ratios: Vec<f64> = windows.iter().filter_map(|w| w.efficiency_ratio).collect();
    let mean_efficiency_ratio = if ratios.is_empty() {
        None
    } else {
        Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
    };

    AggregateReport {
        window_count: n,
        skipped_count,
        mean_test_return: mean_test,
        stdev_test_return: var.sqrt(),
        fraction_positive: test_returns.iter().filter(|r| **r > 0.0).count() as f64 / n as f64,
        fraction_consistent: windows.iter().filter(|w| w.consistent).count() as f64 / n as f64,
        mean_efficiency_ratio,
        mean_overfitting_score: windows.iter().map(|w| w.overfitting_score).sum::<f64>()
            / n as f64,
    }
}
