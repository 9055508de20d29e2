//! End-to-end simulator scenarios.

use chrono::{DateTime, Duration, TimeZone, Utc};
use stratlab_core::config::{StrategyParams, StrategySpec};
use stratlab_core::domain::{Bar, Direction, ExitReason};
use stratlab_core::sim::Simulator;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
}

/// 4h bars with plausible OHLV generated from closes.
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

/// Short EMA/filter periods so scenarios fit in small series. The ZLHMA
/// keeps its production period: it stays well below price during a sharp
/// ramp, so scenario positions are not cut short by the baseline exit.
/// Costs, ladder, and pyramiding are off unless a scenario re-enables them.
fn scenario_params() -> StrategyParams {
    let mut p = StrategyParams::zlhma_ema_defaults();
    p.strategy = StrategySpec::ZlhmaEmaCross {
        zlhma_period: 14,
        fast_ema_period: 3,
        slow_ema_period: 6,
    };
    p.adx_period = 3;
    p.adx_threshold = 0.0;
    p.atr_period = 3;
    p.slippage_pct = 0.0;
    p.commission_pct = 0.0;
    p.ladder = Vec::new();
    p.max_pyramid_legs = 0;
    p
}

/// Decline into a V-bottom, then a monotone ramp. The fast EMA crosses
/// above the slow one once, early in the ramp, and never crosses back.
fn v_shaped_closes(decline_bars: usize, rise_bars: usize, rise_step: f64) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..decline_bars)
        .map(|i| 150.0 - 2.0 * i as f64)
        .collect();
    let bottom = closes.last().copied().unwrap() + 2.0;
    closes.extend((0..rise_bars).map(|i| bottom + rise_step * i as f64));
    closes
}

#[test]
fn single_golden_cross_yields_one_long_trade() {
    let bars = make_bars(&v_shaped_closes(30, 25, 5.0));
    let sim = Simulator::new(scenario_params(), 10_000.0).unwrap();
    let result = sim.run(&bars).unwrap();

    assert_eq!(result.trades.len(), 1, "exactly one entry expected");
    let trade = &result.trades[0];
    assert_eq!(trade.direction, Direction::Long);
    // Entered on the cross, during the ramp.
    assert!(trade.entry_time > bars[30].timestamp);
    // Closed by the signal exit or carried to the forced final close;
    // either way the rising market leaves it profitable.
    assert!(!trade.exit_reason.is_partial());
    assert!(trade.realized_pnl > 0.0);
}

#[test]
fn flat_series_produces_zero_trades() {
    let bars = make_bars(&[100.0; 120]);
    let sim = Simulator::new(scenario_params(), 10_000.0).unwrap();
    let result = sim.run(&bars).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.final_capital, 10_000.0);
    // Every evaluated bar still produced an equity point.
    assert_eq!(result.equity_curve.len(), bars.len() - result.warmup_bars);
    assert!(result
        .equity_curve
        .iter()
        .all(|p| p.total_equity == 10_000.0 && p.unrealized_pnl == 0.0));
}

#[test]
fn ladder_rungs_fire_once_each_then_remainder_closes() {
    let mut params = scenario_params();
    params.ladder = StrategyParams::zlhma_ema_defaults().ladder;

    // 4 points per bar is roughly +4% of the entry price per bar, so the
    // +5/+10/+15% rungs become eligible on separate bars shortly after
    // the cross.
    let bars = make_bars(&v_shaped_closes(30, 20, 4.0));
    let sim = Simulator::new(params, 10_000.0).unwrap();
    let result = sim.run(&bars).unwrap();

    let partials: Vec<_> = result
        .trades
        .iter()
        .filter(|t| t.exit_reason.is_partial())
        .collect();
    assert_eq!(partials.len(), 3, "each rung fires exactly once");
    for rung in 0..3 {
        assert_eq!(
            partials
                .iter()
                .filter(|t| t.exit_reason == ExitReason::PartialExit { rung })
                .count(),
            1
        );
    }

    let finals: Vec<_> = result
        .trades
        .iter()
        .filter(|t| !t.exit_reason.is_partial())
        .collect();
    assert_eq!(finals.len(), 1, "one terminal close for the remainder");

    // Partial sizes plus the final size add back up to the entry size.
    let entry_price = finals[0].entry_price;
    let initial_shares = 10_000.0 * 0.10 / entry_price;
    let exited: f64 = result.trades.iter().map(|t| t.size).sum();
    assert!((exited - initial_shares).abs() < 1e-9);
}

#[test]
fn capital_conservation_holds_with_costs() {
    let mut params = scenario_params();
    params.slippage_pct = 0.001;
    params.commission_pct = 0.0006;
    params.ladder = StrategyParams::zlhma_ema_defaults().ladder;
    params.max_pyramid_legs = 3;

    // Wavy drift: several entries, stops, and partials along the way.
    let closes: Vec<f64> = (0..400)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.12).sin() * 9.0 + (t * 0.045).cos() * 14.0 + t * 0.05
        })
        .collect();
    let bars = make_bars(&closes);
    let sim = Simulator::new(params, 10_000.0).unwrap();
    let result = sim.run(&bars).unwrap();

    let pnl: f64 = result.trades.iter().map(|t| t.realized_pnl).sum();
    let expected = result.initial_capital + pnl - result.total_commission;
    assert!(
        (result.final_capital - expected).abs() < 1e-6,
        "conservation violated: final={} expected={}",
        result.final_capital,
        expected
    );
}

#[test]
fn identical_runs_serialize_identically() {
    let params = scenario_params();
    let bars = make_bars(&v_shaped_closes(30, 25, 3.0));

    let a = Simulator::new(params.clone(), 10_000.0)
        .unwrap()
        .run(&bars)
        .unwrap();
    let b = Simulator::new(params, 10_000.0).unwrap().run(&bars).unwrap();

    let ja = serde_json::to_vec(&a).unwrap();
    let jb = serde_json::to_vec(&b).unwrap();
    assert_eq!(ja, jb);
}

#[test]
fn open_position_is_force_closed_at_end_of_data() {
    // Short ramp: the cross fires close to the end of the series, so the
    // position is still open at the final bar.
    let bars = make_bars(&v_shaped_closes(30, 8, 5.0));
    let sim = Simulator::new(scenario_params(), 10_000.0).unwrap();
    let result = sim.run(&bars).unwrap();

    let last = result.trades.last().expect("one trade expected");
    assert_eq!(last.exit_reason, ExitReason::EndOfData);
    // End-of-data fills at the final close as given, no slippage.
    assert_eq!(last.exit_price, bars.last().unwrap().close);
    assert_eq!(last.exit_time, bars.last().unwrap().timestamp);
}
