//! End-to-end walk-forward harness tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use stratlab_core::config::{StrategyParams, StrategySpec};
use stratlab_core::domain::Bar;
use stratlab_runner::{run_walk_forward, RunConfig, WindowSpec};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
}

fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base_time() + Duration::hours(4 * i as i64),
                open,
                high: open.max(close) + 0.25,
                low: open.min(close) - 0.25,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Wavy drift with enough swings to trade in every window.
fn wavy_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.12).sin() * 9.0 + (t * 0.045).cos() * 14.0 + t * 0.05
        })
        .collect()
}

/// Short periods so a 120-bar training span clears warm-up.
fn test_config() -> RunConfig {
    let mut params = StrategyParams::zlhma_ema_defaults();
    params.strategy = StrategySpec::ZlhmaEmaCross {
        zlhma_period: 14,
        fast_ema_period: 3,
        slow_ema_period: 6,
    };
    params.adx_period = 3;
    params.adx_threshold = 0.0;
    params.atr_period = 3;

    RunConfig {
        params,
        initial_capital: 10_000.0,
        walk_forward: WindowSpec {
            train_span: 120,
            test_span: 60,
            step: 60,
            lookback_buffer: 30,
        },
    }
}

#[test]
fn report_covers_every_window_in_order() {
    let bars = make_bars(&wavy_closes(500));
    let report = run_walk_forward(&test_config(), &bars).unwrap();

    // test_end = start + 180 must fit in 500 bars at step 60.
    assert_eq!(report.windows.len(), 6);
    assert!(report.skipped.is_empty());
    for (i, w) in report.windows.iter().enumerate() {
        assert_eq!(w.window_id, i);
        assert_eq!(w.train_range.start, i * 60);
        assert_eq!(w.test_range.start, w.train_range.end);
        assert_eq!(w.test_range.end - w.test_range.start, 60);
    }
    assert_eq!(report.aggregate.window_count, 6);
    assert_eq!(report.aggregate.skipped_count, 0);
}

#[test]
fn identical_runs_serialize_identically() {
    let bars = make_bars(&wavy_closes(500));
    let config = test_config();

    let a = run_walk_forward(&config, &bars).unwrap();
    let b = run_walk_forward(&config, &bars).unwrap();

    let ja = serde_json::to_vec(&a).unwrap();
    let jb = serde_json::to_vec(&b).unwrap();
    assert_eq!(ja, jb);
}

#[test]
fn windows_too_short_for_warmup_are_skipped_not_fatal() {
    let mut config = test_config();
    // 20 training bars cannot clear the ~24-bar warm-up.
    config.walk_forward = WindowSpec {
        train_span: 20,
        test_span: 30,
        step: 50,
        lookback_buffer: 30,
    };
    let bars = make_bars(&wavy_closes(200));

    let report = run_walk_forward(&config, &bars).unwrap();
    assert!(report.windows.is_empty());
    assert_eq!(report.skipped.len(), 4);
    assert_eq!(report.aggregate.window_count, 0);
    assert_eq!(report.aggregate.skipped_count, 4);
    for skip in &report.skipped {
        assert!(skip.reason.contains("train run failed"), "{}", skip.reason);
    }
}

#[test]
fn history_shorter_than_one_window_is_an_error() {
    let bars = make_bars(&wavy_closes(100));
    let result = run_walk_forward(&test_config(), &bars);
    assert!(result.is_err());
}

#[test]
fn window_reports_do_not_depend_on_future_bars() {
    let config = test_config();
    let bars = make_bars(&wavy_closes(500));
    let baseline = run_walk_forward(&config, &bars).unwrap();

    // Rewrite everything from bar 400 on. Windows 0..=3 end at or before
    // bar 360 and must be untouched.
    let mut closes = wavy_closes(500);
    for (i, c) in closes.iter_mut().enumerate().skip(400) {
        *c = 50.0 + (i as f64 * 0.3).sin() * 40.0;
    }
    let perturbed_bars = make_bars(&closes);
    let perturbed = run_walk_forward(&config, &perturbed_bars).unwrap();

    for id in 0..=3 {
        let a = &baseline.windows[id];
        let b = &perturbed.windows[id];
        assert!(a.test_range.end <= 400);
        assert_eq!(
            serde_json::to_string(a).unwrap(),
            serde_json::to_string(b).unwrap(),
            "window {id} changed when only future bars changed"
        );
    }
}
