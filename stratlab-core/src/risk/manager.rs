//! Risk manager — owns one simulation run's position lifecycle and capital.
//!
//! State machine: FLAT → OPEN → OPEN (partial exits, pyramid legs) →
//! CLOSED → FLAT. Exactly one position exists at a time; every close
//! (partial or full) appends one immutable `Trade`.
//!
//! Capital accounting keeps commissions separate from gross P&L so that
//! `final == initial + Σ realized_pnl − Σ commissions` holds exactly.
//! Slippage is applied to fill prices (adverse, direction-aware) and
//! therefore shows up inside the gross P&L, not as a separate ledger.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::config::StrategyParams;
use crate::domain::{
    leg_return, Bar, Direction, ExitReason, LadderRung, Position, PyramidLeg, Trade,
};

use super::breaker::DailyLossBreaker;
use super::sizing::{kelly_fraction, throttle_multiplier, TradeSample};

/// A stop decision found intrabar: the reference exit price (pre-slippage)
/// and which stop was hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopHit {
    pub price: f64,
    pub reason: ExitReason,
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    params: StrategyParams,
    initial_capital: f64,
    capital: f64,
    total_commission: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    recent: VecDeque<TradeSample>,
    consecutive_losses: u32,
    breaker: DailyLossBreaker,
}

impl RiskManager {
    pub fn new(params: StrategyParams, initial_capital: f64) -> Self {
        let breaker = DailyLossBreaker::new(
            params.daily_loss_limit_pct * initial_capital,
            params.suspension_hours,
        );
        Self {
            params,
            initial_capital,
            capital: initial_capital,
            total_commission: 0.0,
            position: None,
            trades: Vec::new(),
            recent: VecDeque::new(),
            consecutive_losses: 0,
            breaker,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    /// Advance the daily-loss breaker to `now`; true while entries are
    /// suspended.
    pub fn entries_blocked(&mut self, now: DateTime<Utc>) -> bool {
        self.breaker.blocks(now)
    }

    /// Unrealized P&L of the open position (main entry plus all pyramid
    /// legs) at `price`; zero when flat.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        let Some(pos) = &self.position else {
            return 0.0;
        };
        let mut pnl =
            pos.notional_value * pos.unleveraged_return(price) * self.params.leverage;
        for leg in &pos.pyramid_legs {
            pnl += leg.notional_value
                * leg_return(pos.direction, leg.entry_price, price)
                * self.params.leverage;
        }
        pnl
    }

    // ─── Entry ───────────────────────────────────────────────────────

    /// Open a position at `price` (pre-slippage). Sizing is the throttled
    /// half-Kelly fraction of current capital; the initial stop is the
    /// tighter of the percentage stop and the ATR-multiple stop, fixed at
    /// entry. Returns false when already open or out of capital.
    pub fn open_position(
        &mut self,
        direction: Direction,
        price: f64,
        time: DateTime<Utc>,
        index: usize,
        atr: Option<f64>,
    ) -> bool {
        if self.position.is_some() || self.capital <= 0.0 {
            return false;
        }

        let fill = self.slipped_entry(direction, price);
        let fraction = kelly_fraction(self.recent.make_contiguous(), &self.params);
        let throttle = throttle_multiplier(self.consecutive_losses, &self.params.loss_throttle);
        let notional = self.capital * fraction * throttle;
        let leveraged = notional * self.params.leverage;

        self.charge_commission(notional);

        let stop_fraction = match atr.filter(|a| a.is_finite() && *a > 0.0) {
            Some(a) => self
                .params
                .stop_loss_pct
                .min(self.params.atr_stop_multiple * a / fill),
            None => self.params.stop_loss_pct,
        };
        let stop_price = fill * (1.0 - direction.sign() * stop_fraction);

        self.position = Some(Position {
            direction,
            entry_price: fill,
            entry_time: time,
            entry_index: index,
            notional_value: notional,
            leveraged_value: leveraged,
            share_count: leveraged / fill,
            stop_price,
            trailing_active: false,
            trailing_stop_price: None,
            trailing_reference_price: fill,
            ladder: self
                .params
                .ladder
                .iter()
                .map(|r| LadderRung {
                    profit_threshold_pct: r.profit_threshold_pct,
                    exit_fraction: r.exit_fraction,
                    done: false,
                })
                .collect(),
            pyramid_legs: Vec::new(),
            original_notional: notional,
        });
        true
    }

    // ─── Partial exits ───────────────────────────────────────────────

    /// Fire at most one ladder rung at the bar close; highest eligible
    /// rung first. Each rung closes a fraction of the currently remaining
    /// main position and never fires twice.
    pub fn check_partial_exits(&mut self, bar: &Bar, index: usize) -> bool {
        let Some(pos) = &self.position else {
            return false;
        };
        let profit_pct = pos.profit_pct(bar.close);

        let Some(rung_idx) = pos
            .ladder
            .iter()
            .enumerate()
            .rev()
            .find(|(_, r)| !r.done && profit_pct >= r.profit_threshold_pct)
            .map(|(i, _)| i)
        else {
            return false;
        };

        let direction = pos.direction;
        let fill = self.slipped_exit(direction, bar.close);

        let pos = self.position.as_mut().expect("checked above");
        let rung = &mut pos.ladder[rung_idx];
        rung.done = true;
        let fraction = rung.exit_fraction;

        let exit_notional = pos.notional_value * fraction;
        let exit_shares = pos.share_count * fraction;
        pos.notional_value *= 1.0 - fraction;
        pos.leveraged_value *= 1.0 - fraction;
        pos.share_count *= 1.0 - fraction;

        let ret = leg_return(direction, pos.entry_price, fill);
        let gross = exit_notional * ret * self.params.leverage;
        let trade = Trade {
            entry_time: pos.entry_time,
            exit_time: bar.timestamp,
            direction,
            entry_price: pos.entry_price,
            exit_price: fill,
            size: exit_shares,
            realized_pnl: gross,
            pnl_pct: ret * 100.0,
            exit_reason: ExitReason::PartialExit { rung: rung_idx },
            pyramid_legs_count: pos.pyramid_legs.len(),
            holding_bars: index - pos.entry_index,
        };

        self.capital += gross;
        self.charge_commission(exit_notional);
        self.push_trade(trade);
        true
    }

    // ─── Stops ───────────────────────────────────────────────────────

    /// Update the running extreme and trailing stop from this bar, then
    /// check the stops against the bar's high/low (intrabar touches are
    /// honored, not just the close).
    ///
    /// The trailing stop arms once unleveraged profit at the close crosses
    /// the activation threshold, starting at the entry-price profit lock;
    /// afterwards it trails the favorable extreme and only ever tightens.
    /// Until it arms, the fixed initial stop applies.
    pub fn check_stops(&mut self, bar: &Bar) -> Option<StopHit> {
        let pos = self.position.as_mut()?;
        pos.update_extreme(bar.high, bar.low);

        let profit_pct = pos.profit_pct(bar.close);
        let sign = pos.direction.sign();

        if !pos.trailing_active && profit_pct >= self.params.trailing_activation_pct {
            pos.trailing_active = true;
            pos.trailing_stop_price =
                Some(pos.entry_price * (1.0 + sign * self.params.trailing_initial_lock_pct));
        }
        if pos.trailing_active {
            let candidate =
                pos.trailing_reference_price * (1.0 - sign * self.params.trailing_distance_pct);
            let current = pos.trailing_stop_price.unwrap_or(candidate);
            let tightened = match pos.direction {
                Direction::Long => candidate.max(current),
                Direction::Short => candidate.min(current),
            };
            pos.trailing_stop_price = Some(tightened);
        }

        match pos.direction {
            Direction::Long => {
                if let (true, Some(stop)) = (pos.trailing_active, pos.trailing_stop_price) {
                    if bar.low <= stop {
                        return Some(StopHit {
                            price: stop.min(bar.open),
                            reason: ExitReason::TrailingStop,
                        });
                    }
                } else if bar.low <= pos.stop_price {
                    return Some(StopHit {
                        price: pos.stop_price.min(bar.open),
                        reason: ExitReason::StopLoss,
                    });
                }
            }
            Direction::Short => {
                if let (true, Some(stop)) = (pos.trailing_active, pos.trailing_stop_price) {
                    if bar.high >= stop {
                        return Some(StopHit {
                            price: stop.max(bar.open),
                            reason: ExitReason::TrailingStop,
                        });
                    }
                } else if bar.high >= pos.stop_price {
                    return Some(StopHit {
                        price: pos.stop_price.max(bar.open),
                        reason: ExitReason::StopLoss,
                    });
                }
            }
        }
        None
    }

    // ─── Pyramiding ──────────────────────────────────────────────────

    /// Add one same-direction leg when the next profit gate (measured at
    /// the bar's favorable extreme) is reached and the leg count allows.
    /// Legs are sized as declining fractions of the original notional and
    /// share the parent stop/exit logic.
    pub fn try_pyramid(&mut self, bar: &Bar, index: usize) -> bool {
        let Some(pos) = &self.position else {
            return false;
        };
        let legs = pos.pyramid_legs.len();
        if legs >= self.params.max_pyramid_legs {
            return false;
        }

        let (reference, raw_fill) = match pos.direction {
            Direction::Long => (bar.high, bar.high.max(bar.open)),
            Direction::Short => (bar.low, bar.low.min(bar.open)),
        };
        if pos.profit_pct(reference) < self.params.pyramid_profit_gates_pct[legs] {
            return false;
        }

        let direction = pos.direction;
        let fill = self.slipped_entry(direction, raw_fill);
        let notional = self.position.as_ref().expect("checked above").original_notional
            * self.params.pyramid_size_fractions[legs];
        let leveraged = notional * self.params.leverage;

        self.charge_commission(notional);
        self.position
            .as_mut()
            .expect("checked above")
            .pyramid_legs
            .push(PyramidLeg {
                entry_price: fill,
                entry_time: bar.timestamp,
                entry_index: index,
                notional_value: notional,
                leveraged_value: leveraged,
                share_count: leveraged / fill,
            });
        true
    }

    // ─── Full close ──────────────────────────────────────────────────

    /// Close the remaining main position and all pyramid legs at `price`.
    /// Slippage applies except on the forced end-of-data close, which
    /// fills at the final close as given. Updates capital, the daily-loss
    /// counter, and the consecutive-loss streak, then returns to FLAT.
    pub fn close_position(
        &mut self,
        price: f64,
        time: DateTime<Utc>,
        index: usize,
        reason: ExitReason,
    ) {
        let Some(pos) = self.position.take() else {
            return;
        };

        let fill = if reason == ExitReason::EndOfData {
            price
        } else {
            self.slipped_exit(pos.direction, price)
        };

        let main_ret = leg_return(pos.direction, pos.entry_price, fill);
        let mut gross = pos.notional_value * main_ret * self.params.leverage;
        let mut commission_base = pos.notional_value;
        for leg in &pos.pyramid_legs {
            gross += leg.notional_value
                * leg_return(pos.direction, leg.entry_price, fill)
                * self.params.leverage;
            commission_base += leg.notional_value;
        }

        let commission = commission_base * self.params.commission_pct;
        self.capital += gross;
        self.capital -= commission;
        self.total_commission += commission;

        let net = gross - commission;
        if net < 0.0 {
            self.breaker.record_loss(-net);
        }
        if gross > 0.0 {
            self.consecutive_losses = 0;
        } else {
            self.consecutive_losses += 1;
        }

        self.push_trade(Trade {
            entry_time: pos.entry_time,
            exit_time: time,
            direction: pos.direction,
            entry_price: pos.entry_price,
            exit_price: fill,
            size: pos.share_count,
            realized_pnl: gross,
            pnl_pct: main_ret * 100.0,
            exit_reason: reason,
            pyramid_legs_count: pos.pyramid_legs.len(),
            holding_bars: index - pos.entry_index,
        });
    }

    // ─── Internals ───────────────────────────────────────────────────

    /// Adverse entry fill: pay up for longs, receive less for shorts.
    fn slipped_entry(&self, direction: Direction, price: f64) -> f64 {
        price * (1.0 + direction.sign() * self.params.slippage_pct)
    }

    /// Adverse exit fill: the mirror of the entry adjustment.
    fn slipped_exit(&self, direction: Direction, price: f64) -> f64 {
        price * (1.0 - direction.sign() * self.params.slippage_pct)
    }

    fn charge_commission(&mut self, notional: f64) {
        let commission = notional * self.params.commission_pct;
        self.capital -= commission;
        self.total_commission += commission;
    }

    fn push_trade(&mut self, trade: Trade) {
        self.recent.push_back(TradeSample {
            pnl: trade.realized_pnl,
            pnl_pct: trade.pnl_pct,
        });
        while self.recent.len() > self.params.kelly_window {
            self.recent.pop_front();
        }
        self.trades.push(trade);
    }
}
