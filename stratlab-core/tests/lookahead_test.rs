//! Look-ahead contamination tests for every indicator and for the
//! signal evaluators built on top of them.
//!
//! Invariant: no indicator value at bar t may depend on price data from
//! bar t+1 or later. The declared Ichimoku cloud shift stores values
//! forward, so reading a shifted line at bar t still uses only past bars.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200) and assert bars 0..100 are identical. Any difference means
//! future data is leaking into past values.

use chrono::{DateTime, Duration, TimeZone, Utc};
use stratlab_core::config::{StrategyParams, StrategySpec};
use stratlab_core::domain::{Bar, Direction};
use stratlab_core::indicators::{
    Adx, AdxSeries, Atr, Donchian, DonchianBand, Ema, Hma, Ichimoku, IchimokuLine, Indicator,
    IndicatorFrame, Rsi, Wma, Zlema, Zlhma,
};
use stratlab_core::signals::build_evaluator;

/// Generate N bars of synthetic OHLCV data with deterministic variation.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Simple LCG pseudo-random walk, reproducible across runs.
        let seed = (i as u64)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let change = ((seed % 200) as f64 - 100.0) * 0.05; // -5.0 to +5.0
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(Bar {
            timestamp: base + Duration::hours(4 * i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000.0 + i as f64 * 100.0,
        });
    }

    bars
}

/// Assert the indicator produces identical values for bars 0..truncated_len
/// whether computed on the truncated or the full series.
fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated_result = indicator.compute(&full_bars[..truncated_len]);
    let full_result = indicator.compute(full_bars);

    assert_eq!(
        truncated_result.len(),
        truncated_len,
        "{}: truncated result length mismatch",
        indicator.name()
    );
    assert_eq!(
        full_result.len(),
        full_bars.len(),
        "{}: full result length mismatch",
        indicator.name()
    );

    for i in 0..truncated_len {
        let t = truncated_result[i];
        let f = full_result[i];

        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{}: NaN mismatch at bar {i} (truncated={t}, full={f})",
            indicator.name()
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{}: look-ahead contamination at bar {i}: truncated={t}, full={f}",
            indicator.name()
        );
    }
}

#[test]
fn lookahead_wma() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Wma::new(10), &bars, 100);
    assert_no_lookahead(&Wma::new(20), &bars, 100);
}

#[test]
fn lookahead_ema() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Ema::new(10), &bars, 100);
    assert_no_lookahead(&Ema::new(50), &bars, 100);
}

#[test]
fn lookahead_hma() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Hma::new(9), &bars, 100);
    assert_no_lookahead(&Hma::new(14), &bars, 100);
}

#[test]
fn lookahead_zlema() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Zlema::new(10), &bars, 100);
    assert_no_lookahead(&Zlema::new(21), &bars, 100);
}

#[test]
fn lookahead_zlhma() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Zlhma::new(14), &bars, 100);
    assert_no_lookahead(&Zlhma::new(8), &bars, 100);
}

#[test]
fn lookahead_atr() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Atr::new(14), &bars, 100);
    assert_no_lookahead(&Atr::new(5), &bars, 100);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
    assert_no_lookahead(&Rsi::new(7), &bars, 100);
}

#[test]
fn lookahead_adx() {
    let bars = make_test_bars(200);
    for series in [AdxSeries::Adx, AdxSeries::DiPlus, AdxSeries::DiMinus] {
        assert_no_lookahead(&Adx::new(14, series), &bars, 100);
        assert_no_lookahead(&Adx::new(7, series), &bars, 100);
    }
}

#[test]
fn lookahead_donchian() {
    let bars = make_test_bars(200);
    for band in [
        DonchianBand::Upper,
        DonchianBand::Lower,
        DonchianBand::Middle,
        DonchianBand::PricePosition,
    ] {
        assert_no_lookahead(&Donchian::new(20, band), &bars, 100);
    }
}

#[test]
fn lookahead_ichimoku() {
    let bars = make_test_bars(200);
    for line in [
        IchimokuLine::Tenkan,
        IchimokuLine::Kijun,
        IchimokuLine::SpanA,
        IchimokuLine::SpanB,
        IchimokuLine::CloudTop,
        IchimokuLine::CloudBottom,
    ] {
        assert_no_lookahead(&Ichimoku::new(9, 26, 52, 26, line), &bars, 100);
    }
}

/// Entry decisions at bar t must not change when bars after t change.
/// Runs every evaluator over frames built from the truncated and the full
/// series and compares the decision at each index below the truncation.
#[test]
fn evaluator_decisions_ignore_future_bars() {
    let full = make_test_bars(200);
    let truncated = &full[..100];

    // Shorter EMA cross than the production defaults so warm-up finishes
    // well inside the truncated range.
    let mut zlhma = StrategyParams::zlhma_ema_defaults();
    zlhma.strategy = StrategySpec::ZlhmaEmaCross {
        zlhma_period: 14,
        fast_ema_period: 10,
        slow_ema_period: 30,
    };

    for params in [
        zlhma,
        StrategyParams::ichimoku_defaults(),
        StrategyParams::donchian_defaults(),
    ] {
        let evaluator = build_evaluator(&params);
        let indicators = evaluator.indicators();
        let frame_full = IndicatorFrame::build(&indicators, &full);
        let frame_trunc = IndicatorFrame::build(&indicators, truncated);

        for i in evaluator.warmup_bars()..100 {
            for direction in [Direction::Long, Direction::Short] {
                let a = evaluator.evaluate_entry(truncated, i, &frame_trunc, direction);
                let b = evaluator.evaluate_entry(&full, i, &frame_full, direction);
                assert_eq!(
                    a.can_enter,
                    b.can_enter,
                    "{}: entry decision at bar {i} changed with future bars",
                    evaluator.name()
                );
                assert!(
                    (a.strength - b.strength).abs() < 1e-10,
                    "{}: signal strength at bar {i} changed with future bars",
                    evaluator.name()
                );
            }
        }
    }
}
