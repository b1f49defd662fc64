//! The daily clock-in / clock-out lifecycle.
//!
//! An agent moves `not_clocked -> clocked_in -> clocked_out` once per calendar
//! day. The only way back to `not_clocked` is the day rollover performed by
//! [`normalize_today`] or an operator reset.

use chrono::{NaiveDateTime, Timelike};
use common::{ClockInReceipt, ClockOutReceipt, ResetOutcome, TodayStatus};
use model::entities::{agent_account, daily_earnings, history_log};
use model::{AttendanceStatus, HistoryAction};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use tracing::{debug, info, instrument, trace, warn};

use crate::agents::{lock_account, save_account};
use crate::audit::{ClockOutEntry, record_clock_in, record_clock_out};
use crate::balance::apply_earnings;
use crate::converters::attendance_state;
use crate::earnings::{DaySettlement, record_day, resync_locked};
use crate::error::{LedgerError, Result};
use crate::money::{earnings, month_start, round2, work_hours};
use crate::Ledger;

/// Brings an account's "today" fields and month counter up to date with `now`.
///
/// A clocked state whose clock-in happened on another date (or that has no
/// clock-in time at all) is reset to `not_clocked` with every today-field
/// cleared. When the month changed, `current_month_earnings` starts over.
/// Returns whether anything changed; the caller persists the row.
pub fn normalize_today(account: &mut agent_account::Model, now: NaiveDateTime) -> bool {
    let today = now.date();
    let mut changed = false;

    let stale = match account.today_status {
        AttendanceStatus::NotClocked => account
            .today_clock_in_time
            .is_some_and(|clock_in| clock_in.date() != today),
        AttendanceStatus::ClockedIn | AttendanceStatus::ClockedOut => account
            .today_clock_in_time
            .is_none_or(|clock_in| clock_in.date() != today),
    };
    if stale {
        debug!(
            "Rolling agent {} over from {:?} (clock-in {:?}) to {}",
            account.id, account.today_status, account.today_clock_in_time, today
        );
        clear_today(account);
        changed = true;
    }

    let month = month_start(today);
    if account.earnings_month < month {
        debug!("Starting new earnings month {} for agent {}", month, account.id);
        account.current_month_earnings = Decimal::ZERO;
        account.earnings_month = month;
        changed = true;
    }

    if changed {
        account.updated_at = now;
    }
    changed
}

fn clear_today(account: &mut agent_account::Model) {
    account.today_status = AttendanceStatus::NotClocked;
    account.today_clock_in_time = None;
    account.today_clock_out_time = None;
    account.today_work_hours = Decimal::ZERO;
    account.today_total_earnings = Decimal::ZERO;
}

/// Timestamps are stored to the second.
fn truncate_subsec(at: NaiveDateTime) -> NaiveDateTime {
    at.with_nanosecond(0).unwrap_or(at)
}

impl Ledger {
    #[instrument(skip(self))]
    pub async fn clock_in(&self, agent_id: i32) -> Result<ClockInReceipt> {
        trace!("Entering clock_in function");
        let now = truncate_subsec(self.now());

        let txn = self.db.begin().await?;
        let mut account = lock_account(&txn, agent_id).await?;
        normalize_today(&mut account, now);

        match account.today_status {
            AttendanceStatus::NotClocked => {}
            AttendanceStatus::ClockedIn => {
                warn!("Agent {} tried to clock in twice", agent_id);
                return Err(LedgerError::AlreadyClockedIn(agent_id));
            }
            AttendanceStatus::ClockedOut => {
                warn!("Agent {} tried to clock in after clocking out", agent_id);
                return Err(LedgerError::AlreadyClockedOut(agent_id));
            }
        }

        clear_today(&mut account);
        account.today_status = AttendanceStatus::ClockedIn;
        account.today_clock_in_time = Some(now);
        account.updated_at = now;
        save_account(&txn, &account).await?;

        record_clock_in(&txn, agent_id, now).await;
        txn.commit().await?;

        info!("Agent {} clocked in at {}", agent_id, now);
        Ok(ClockInReceipt {
            agent_id,
            status: attendance_state(account.today_status),
            clock_in_time: now,
        })
    }

    /// Ends today's session and credits its earnings to the balance.
    #[instrument(skip(self))]
    pub async fn clock_out(&self, agent_id: i32) -> Result<ClockOutReceipt> {
        trace!("Entering clock_out function");
        let now = truncate_subsec(self.now());
        let today = now.date();

        let txn = self.db.begin().await?;
        let mut account = lock_account(&txn, agent_id).await?;
        normalize_today(&mut account, now);

        let clock_in = match (account.today_status, account.today_clock_in_time) {
            (AttendanceStatus::ClockedIn, Some(clock_in)) => clock_in,
            _ => {
                warn!("Agent {} tried to clock out while {:?}", agent_id, account.today_status);
                return Err(LedgerError::NotClockedIn(agent_id));
            }
        };

        let hours = work_hours(clock_in, now);
        let hourly_rate = account.hourly_rate;
        let earned = earnings(hours, hourly_rate);
        debug!("Agent {} worked {} h at {} = {}", agent_id, hours, hourly_rate, earned);

        let settlement = DaySettlement {
            agent_id,
            date: today,
            work_hours: hours,
            hourly_rate,
            earnings: earned,
            clock_in,
            clock_out: now,
        };
        let previous = record_day(&txn, &settlement).await?;
        let delta = round2(earned - previous);
        if !delta.is_zero() {
            let description = format!("Earnings for {today}: {hours} h at {hourly_rate}");
            apply_earnings(&txn, &mut account, delta, &description, now).await?;
        }

        account.today_status = AttendanceStatus::ClockedOut;
        account.today_clock_out_time = Some(now);
        account.today_work_hours = hours;
        account.today_total_earnings = earned;
        account.updated_at = now;
        save_account(&txn, &account).await?;

        record_clock_out(
            &txn,
            ClockOutEntry {
                agent_id,
                date: today,
                clock_in,
                clock_out: now,
                work_hours: hours,
                earnings: earned,
            },
        )
        .await;
        txn.commit().await?;

        info!("Agent {} clocked out, earned {}", agent_id, earned);
        Ok(ClockOutReceipt {
            agent_id,
            work_hours: hours,
            hourly_rate,
            earnings: earned,
            new_balance: account.available_balance,
        })
    }

    /// Today's attendance for an agent. Persists a pending day rollover first.
    #[instrument(skip(self))]
    pub async fn today_status(&self, agent_id: i32) -> Result<TodayStatus> {
        trace!("Entering today_status function");
        let now = truncate_subsec(self.now());
        let account = self.refresh_account(agent_id).await?;

        let (minutes, hours, earned) = match account.today_status {
            AttendanceStatus::NotClocked => (0, Decimal::ZERO, Decimal::ZERO),
            AttendanceStatus::ClockedIn => match account.today_clock_in_time {
                Some(clock_in) => {
                    let hours = work_hours(clock_in, now);
                    let minutes = (now - clock_in).num_minutes().max(0);
                    (minutes, hours, earnings(hours, account.hourly_rate))
                }
                None => (0, Decimal::ZERO, Decimal::ZERO),
            },
            AttendanceStatus::ClockedOut => {
                let minutes = account
                    .today_clock_in_time
                    .zip(account.today_clock_out_time)
                    .map_or(0, |(clock_in, clock_out)| {
                        (clock_out - clock_in).num_minutes().max(0)
                    });
                (minutes, account.today_work_hours, account.today_total_earnings)
            }
        };

        Ok(TodayStatus {
            agent_id,
            date: now.date(),
            status: attendance_state(account.today_status),
            clock_in_time: account.today_clock_in_time,
            clock_out_time: account.today_clock_out_time,
            work_duration_minutes: minutes,
            work_hours: hours,
            earnings: earned,
        })
    }

    /// Operator correction: wipes today's attendance for an agent and reverses
    /// whatever it had credited.
    #[instrument(skip(self))]
    pub async fn reset_today(&self, agent_id: i32) -> Result<ResetOutcome> {
        trace!("Entering reset_today function");
        let now = truncate_subsec(self.now());
        let today = now.date();

        let txn = self.db.begin().await?;
        let mut account = lock_account(&txn, agent_id).await?;
        normalize_today(&mut account, now);

        let removed_earnings = daily_earnings::Entity::delete_many()
            .filter(daily_earnings::Column::AgentId.eq(agent_id))
            .filter(daily_earnings::Column::Date.eq(today))
            .exec(&txn)
            .await?
            .rows_affected;

        let removed_history = history_log::Entity::delete_many()
            .filter(history_log::Column::AgentId.eq(agent_id))
            .filter(history_log::Column::ActionDate.eq(today))
            .filter(history_log::Column::ActionType.is_in(HistoryAction::attendance()))
            .exec(&txn)
            .await?
            .rows_affected;

        clear_today(&mut account);
        account.updated_at = now;
        save_account(&txn, &account).await?;

        let resync = resync_locked(&txn, &mut account, now).await?;
        txn.commit().await?;

        info!(
            "Reset agent {} today: removed {} records and {} history rows, adjusted by {}",
            agent_id, removed_earnings, removed_history, resync.adjustment
        );
        Ok(ResetOutcome {
            agent_id,
            date: today,
            removed_earnings_records: removed_earnings,
            removed_history_rows: removed_history,
            balance_adjustment: resync.adjustment,
            available_balance: account.available_balance,
        })
    }
}
