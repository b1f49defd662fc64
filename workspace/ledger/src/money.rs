//! Fixed-point money and duration arithmetic.
//!
//! Every amount that leaves this module carries exactly two decimal places,
//! rounded half away from zero.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

use model::entities::{agent_account, daily_earnings, history_log, withdrawal_request};

use crate::error::{LedgerError, Result};

const SECONDS_PER_HOUR: i64 = 3600;

/// Rounds to two decimals, half away from zero, and pins the scale at 2.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Hours between two timestamps, rounded to hundredths and never negative.
pub fn work_hours(clock_in: NaiveDateTime, clock_out: NaiveDateTime) -> Decimal {
    let seconds = (clock_out - clock_in).num_seconds().max(0);
    round2(Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR))
}

/// Base earnings for `hours` worked at `hourly_rate`.
pub fn earnings(hours: Decimal, hourly_rate: Decimal) -> Decimal {
    round2(hours * hourly_rate)
}

/// Checks a withdrawal amount: strictly positive with at most two decimals.
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!("{amount} is not positive")));
    }
    if amount.normalize().scale() > 2 {
        return Err(LedgerError::InvalidAmount(format!(
            "{amount} has more than two decimal places"
        )));
    }
    Ok(round2(amount))
}

/// Checks an hourly rate: zero or positive with at most two decimals.
pub fn validate_rate(rate: Decimal) -> Result<Decimal> {
    if rate < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!("hourly rate {rate} is negative")));
    }
    if rate.normalize().scale() > 2 {
        return Err(LedgerError::InvalidAmount(format!(
            "hourly rate {rate} has more than two decimal places"
        )));
    }
    Ok(round2(rate))
}

/// First day of the month `date` falls in.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Re-rounds the money columns of a row read back from the store.
///
/// SQLite keeps decimals as floating point, so values come back with
/// representation noise that must not leak into sums or comparisons.
pub trait RoundMoney {
    fn rounded(self) -> Self;
}

impl RoundMoney for agent_account::Model {
    fn rounded(mut self) -> Self {
        self.hourly_rate = round2(self.hourly_rate);
        self.available_balance = round2(self.available_balance);
        self.total_earnings = round2(self.total_earnings);
        self.current_month_earnings = round2(self.current_month_earnings);
        self.pending_withdrawals = round2(self.pending_withdrawals);
        self.total_withdrawals = round2(self.total_withdrawals);
        self.total_withdrawn = round2(self.total_withdrawn);
        self.today_work_hours = round2(self.today_work_hours);
        self.today_total_earnings = round2(self.today_total_earnings);
        self
    }
}

impl RoundMoney for daily_earnings::Model {
    fn rounded(mut self) -> Self {
        self.work_hours = round2(self.work_hours);
        self.hourly_rate = round2(self.hourly_rate);
        self.base_earnings = round2(self.base_earnings);
        self.commission_earnings = round2(self.commission_earnings);
        self.bonus_earnings = round2(self.bonus_earnings);
        self.total_earnings = round2(self.total_earnings);
        self
    }
}

impl RoundMoney for history_log::Model {
    fn rounded(mut self) -> Self {
        self.work_hours = self.work_hours.map(round2);
        self.balance_before = self.balance_before.map(round2);
        self.balance_after = self.balance_after.map(round2);
        self.amount = self.amount.map(round2);
        self
    }
}

impl RoundMoney for withdrawal_request::Model {
    fn rounded(mut self) -> Self {
        self.amount = round2(self.amount);
        self.platform_fee = round2(self.platform_fee);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("-1.005")), dec("-1.01"));
        assert_eq!(round2(dec("2.5")).to_string(), "2.50");
    }

    #[test]
    fn test_work_hours_rounds_to_hundredths() {
        assert_eq!(work_hours(at(9, 0, 0), at(11, 30, 0)), dec("2.50"));
        // 20 minutes is 0.3333 hours
        assert_eq!(work_hours(at(9, 0, 0), at(9, 20, 0)), dec("0.33"));
        // 9 seconds is 0.0025 hours
        assert_eq!(work_hours(at(9, 0, 0), at(9, 0, 9)), dec("0.00"));
        assert_eq!(work_hours(at(9, 0, 0), at(9, 0, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_work_hours_clamps_negative_span() {
        assert_eq!(work_hours(at(11, 0, 0), at(9, 0, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_earnings() {
        assert_eq!(earnings(dec("2.50"), dec("20.00")), dec("50.00"));
        assert_eq!(earnings(dec("0.33"), dec("15.55")), dec("5.13"));
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(dec("60")).unwrap(), dec("60.00"));
        assert_eq!(validate_amount(dec("60.100")).unwrap(), dec("60.10"));
        assert!(matches!(validate_amount(dec("0")), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(validate_amount(dec("-5")), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(validate_amount(dec("1.234")), Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_validate_rate_allows_zero() {
        assert_eq!(validate_rate(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert!(validate_rate(dec("-0.01")).is_err());
    }

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
