//! Signal evaluation — weighted entry conditions and direction-aware exits.
//!
//! Evaluators are position-agnostic: they receive bar history and the
//! precomputed indicator frame, never capital or position size. Each
//! strategy variant scores a small set of boolean sub-conditions with fixed
//! weights and compares the sum against `signal_threshold`; an ADX
//! trend-strength gate is a hard precondition on every entry, independent
//! of strength.
//!
//! A NaN read from any required series means "not ready": the evaluator
//! reports no entry and no exit rather than coercing warm-up values into a
//! numeric default.

pub mod donchian_breakout;
pub mod ichimoku_trend;
pub mod zlhma_ema_cross;

pub use donchian_breakout::DonchianBreakout;
pub use ichimoku_trend::IchimokuTrend;
pub use zlhma_ema_cross::ZlhmaEmaCross;

use crate::config::{StrategyParams, StrategySpec};
use crate::domain::{Bar, Direction, ExitReason};
use crate::indicators::{AdxSeries, Adx, Indicator, IndicatorFrame};

/// Weight of the primary condition (the cross/breakout itself).
pub const WEIGHT_PRIMARY: f64 = 2.0;
/// Weight of the momentum-alignment condition.
pub const WEIGHT_MOMENTUM: f64 = 1.0;
/// Weight of each confirmation-only condition.
pub const WEIGHT_CONFIRM: f64 = 0.5;

/// Outcome of an entry evaluation at one bar.
#[derive(Debug, Clone)]
pub struct SignalResult {
    pub can_enter: bool,
    pub direction: Direction,
    /// Tags of the sub-conditions that held (e.g. "ema_golden_cross").
    pub contributing: Vec<&'static str>,
    /// Sum of the weights of the held sub-conditions.
    pub strength: f64,
}

impl SignalResult {
    pub fn none(direction: Direction) -> Self {
        Self {
            can_enter: false,
            direction,
            contributing: Vec::new(),
            strength: 0.0,
        }
    }
}

/// Outcome of an exit evaluation at one bar. `reason` is always set when
/// `should_exit` is true; exits are never silent.
#[derive(Debug, Clone)]
pub struct ExitResult {
    pub should_exit: bool,
    pub reason: Option<ExitReason>,
    /// Human-readable tags for the conditions that triggered the exit.
    pub notes: Vec<&'static str>,
}

impl ExitResult {
    pub fn hold() -> Self {
        Self {
            should_exit: false,
            reason: None,
            notes: Vec::new(),
        }
    }

    pub fn exit(reason: ExitReason, note: &'static str) -> Self {
        Self {
            should_exit: true,
            reason: Some(reason),
            notes: vec![note],
        }
    }
}

/// Trait for strategy signal evaluators.
///
/// Implementations must be deterministic: identical bars, frame, and index
/// always produce identical results, and no value read may come from an
/// index past `index`.
pub trait SignalEvaluator: Send + Sync {
    /// Strategy name (e.g. "zlhma_ema_cross").
    fn name(&self) -> &str;

    /// The indicator set this evaluator reads, including its ADX gate.
    fn indicators(&self) -> Vec<Box<dyn Indicator>>;

    /// Bars required before the first evaluation can produce output.
    fn warmup_bars(&self) -> usize;

    /// Score the weighted entry conditions for `direction` at `index`.
    fn evaluate_entry(
        &self,
        bars: &[Bar],
        index: usize,
        frame: &IndicatorFrame,
        direction: Direction,
    ) -> SignalResult;

    /// Check the direction-aware exit conditions for an open position.
    fn evaluate_exit(
        &self,
        bars: &[Bar],
        index: usize,
        frame: &IndicatorFrame,
        direction: Direction,
    ) -> ExitResult;
}

/// Build the evaluator selected by the parameter bundle.
pub fn build_evaluator(params: &StrategyParams) -> Box<dyn SignalEvaluator> {
    match params.strategy {
        StrategySpec::ZlhmaEmaCross {
            zlhma_period,
            fast_ema_period,
            slow_ema_period,
        } => Box::new(ZlhmaEmaCross::new(
            zlhma_period,
            fast_ema_period,
            slow_ema_period,
            RegimeGate::from_params(params),
            params.signal_threshold,
        )),
        StrategySpec::IchimokuTrend {
            tenkan_period,
            kijun_period,
            senkou_b_period,
            cloud_shift,
        } => Box::new(IchimokuTrend::new(
            tenkan_period,
            kijun_period,
            senkou_b_period,
            cloud_shift,
            RegimeGate::from_params(params),
            params.signal_threshold,
        )),
        StrategySpec::DonchianBreakout {
            channel_period,
            rsi_period,
        } => Box::new(DonchianBreakout::new(
            channel_period,
            rsi_period,
            RegimeGate::from_params(params),
            params.signal_threshold,
        )),
    }
}

/// ADX hard precondition shared by all evaluators.
#[derive(Debug, Clone)]
pub struct RegimeGate {
    period: usize,
    threshold: f64,
    key: String,
}

impl RegimeGate {
    pub fn new(period: usize, threshold: f64) -> Self {
        let key = format!("adx_{period}");
        Self {
            period,
            threshold,
            key,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self::new(params.adx_period, params.adx_threshold)
    }

    pub fn indicator(&self) -> Box<dyn Indicator> {
        Box::new(Adx::new(self.period, AdxSeries::Adx))
    }

    pub fn lookback(&self) -> usize {
        2 * (self.period - 1)
    }

    /// True when the trend-strength floor is met. NaN (warm-up) fails.
    pub fn permits(&self, frame: &IndicatorFrame, index: usize) -> bool {
        frame
            .finite(&self.key, index)
            .is_some_and(|adx| adx >= self.threshold)
    }
}
