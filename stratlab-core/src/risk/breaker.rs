//! Daily loss circuit breaker.
//!
//! Realized losses accumulate per UTC calendar day against a fixed
//! currency limit (a fraction of *initial* capital, so the limit does not
//! shrink with drawdown). Tripping the limit suspends new entries until
//! the cooldown elapses or a day boundary is reached, whichever comes
//! first; the daily counter resets on resume and on every day roll.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};

#[derive(Debug, Clone)]
pub struct DailyLossBreaker {
    limit_amount: f64,
    cooldown: Duration,
    daily_loss: f64,
    current_day: Option<NaiveDate>,
    suspended_until: Option<DateTime<Utc>>,
}

impl DailyLossBreaker {
    pub fn new(limit_amount: f64, cooldown_hours: i64) -> Self {
        Self {
            limit_amount,
            cooldown: Duration::hours(cooldown_hours),
            daily_loss: 0.0,
            current_day: None,
            suspended_until: None,
        }
    }

    /// Advance to `now` and report whether trading is blocked this bar.
    ///
    /// Must be called once per bar before any entry evaluation. Check
    /// order is fixed: resume first, then the day-roll reset, then the
    /// limit trip.
    pub fn blocks(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(until) = self.suspended_until {
            if now >= until || now.hour() == 0 {
                self.suspended_until = None;
                self.daily_loss = 0.0;
            } else {
                return true;
            }
        }

        let today = now.date_naive();
        if self.current_day != Some(today) {
            self.daily_loss = 0.0;
            self.current_day = Some(today);
        }

        if self.daily_loss >= self.limit_amount {
            self.suspended_until = Some(now + self.cooldown);
            return true;
        }
        false
    }

    /// Record a realized net loss (positive magnitude).
    pub fn record_loss(&mut self, amount: f64) {
        if amount > 0.0 {
            self.daily_loss += amount;
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_until.is_some()
    }

    pub fn daily_loss(&self) -> f64 {
        self.daily_loss
    }
}
