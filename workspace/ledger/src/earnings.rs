//! Earnings per day and their reconciliation into account totals.
//!
//! Clock-out settles incrementally through [`record_day`]. Resync recomputes
//! the totals from every stored daily record and books the difference, which
//! makes it the repair path for any drift between records and balance.

use chrono::{NaiveDate, NaiveDateTime};
use common::{ResyncFailure, ResyncOutcome, ResyncReport};
use model::entities::{agent_account, daily_earnings};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{debug, error, info, instrument, trace};

use crate::agents::{lock_account, save_account};
use crate::attendance::normalize_today;
use crate::balance::apply_earnings;
use crate::error::Result;
use crate::money::{RoundMoney, month_start, round2};
use crate::Ledger;

/// One finished session, as settled at clock-out.
#[derive(Debug, Clone)]
pub(crate) struct DaySettlement {
    pub agent_id: i32,
    pub date: NaiveDate,
    pub work_hours: Decimal,
    pub hourly_rate: Decimal,
    pub earnings: Decimal,
    pub clock_in: NaiveDateTime,
    pub clock_out: NaiveDateTime,
}

/// Upserts the agent's record for the settlement date.
///
/// Returns the total the record held before, zero when it is new, so the caller
/// credits only the difference.
pub(crate) async fn record_day(txn: &DatabaseTransaction, day: &DaySettlement) -> Result<Decimal> {
    let previous = daily_earnings::Entity::find()
        .filter(daily_earnings::Column::AgentId.eq(day.agent_id))
        .filter(daily_earnings::Column::Date.eq(day.date))
        .one(txn)
        .await?
        .map(|record| record.rounded().total_earnings)
        .unwrap_or(Decimal::ZERO);

    let record = daily_earnings::ActiveModel {
        agent_id: Set(day.agent_id),
        date: Set(day.date),
        work_hours: Set(day.work_hours),
        hourly_rate: Set(day.hourly_rate),
        base_earnings: Set(day.earnings),
        commission_earnings: Set(Decimal::ZERO),
        bonus_earnings: Set(Decimal::ZERO),
        total_earnings: Set(day.earnings),
        clock_in_time: Set(Some(day.clock_in)),
        clock_out_time: Set(Some(day.clock_out)),
        created_at: Set(day.clock_out),
        updated_at: Set(day.clock_out),
        ..Default::default()
    };

    daily_earnings::Entity::insert(record)
        .on_conflict(
            OnConflict::columns([daily_earnings::Column::AgentId, daily_earnings::Column::Date])
                .update_columns([
                    daily_earnings::Column::WorkHours,
                    daily_earnings::Column::HourlyRate,
                    daily_earnings::Column::BaseEarnings,
                    daily_earnings::Column::CommissionEarnings,
                    daily_earnings::Column::BonusEarnings,
                    daily_earnings::Column::TotalEarnings,
                    daily_earnings::Column::ClockInTime,
                    daily_earnings::Column::ClockOutTime,
                    daily_earnings::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(txn)
        .await?;

    if !previous.is_zero() {
        debug!(
            "Replaced earnings record of agent {} on {} (was {})",
            day.agent_id, day.date, previous
        );
    }
    Ok(previous)
}

/// Recomputes the totals of a locked account from its daily records.
///
/// The lifetime difference goes through [`apply_earnings`], so a negative
/// difference larger than the balance fails the whole resync. Month earnings
/// are then set to the sum of this month's records. Nothing is written when
/// both already match.
pub(crate) async fn resync_locked(
    txn: &DatabaseTransaction,
    account: &mut agent_account::Model,
    now: NaiveDateTime,
) -> Result<ResyncOutcome> {
    let month = month_start(now.date());
    let records = daily_earnings::Entity::find()
        .filter(daily_earnings::Column::AgentId.eq(account.id))
        .all(txn)
        .await?;

    let (total, month_total) = records
        .into_iter()
        .map(RoundMoney::rounded)
        .fold((Decimal::ZERO, Decimal::ZERO), |(total, in_month), record| {
            let in_month = if month_start(record.date) == month {
                in_month + record.total_earnings
            } else {
                in_month
            };
            (total + record.total_earnings, in_month)
        });
    let total = round2(total);
    let month_total = round2(month_total);

    let previous_total = account.total_earnings;
    let adjustment = round2(total - previous_total);
    if !adjustment.is_zero() {
        let description = format!("Earnings resync: recorded {total}, credited {previous_total}");
        apply_earnings(txn, account, adjustment, &description, now).await?;
    }

    if account.current_month_earnings != month_total {
        debug!(
            "Agent {} month earnings {} -> {}",
            account.id, account.current_month_earnings, month_total
        );
        account.current_month_earnings = month_total;
        account.updated_at = now;
        save_account(txn, account).await?;
    }

    Ok(ResyncOutcome {
        agent_id: account.id,
        previous_total,
        recomputed_total: total,
        current_month_earnings: month_total,
        adjustment,
        available_balance: account.available_balance,
    })
}

impl Ledger {
    /// Recomputes one agent's earnings from the daily records and books any drift.
    #[instrument(skip(self))]
    pub async fn resync_earnings(&self, agent_id: i32) -> Result<ResyncOutcome> {
        trace!("Entering resync_earnings function");
        let now = self.now();

        let txn = self.db.begin().await?;
        let mut account = lock_account(&txn, agent_id).await?;
        if normalize_today(&mut account, now) {
            save_account(&txn, &account).await?;
        }
        let outcome = resync_locked(&txn, &mut account, now).await?;
        txn.commit().await?;

        if outcome.adjustment.is_zero() {
            debug!("Agent {} earnings already in sync", agent_id);
        } else {
            info!("Resynced agent {}: adjusted balance by {}", agent_id, outcome.adjustment);
        }
        Ok(outcome)
    }

    /// Resyncs every agent, each in its own transaction.
    ///
    /// A failing agent is reported in [`ResyncReport::failed`] and does not stop
    /// the others. Only listing the agents can fail the call as a whole.
    #[instrument(skip(self))]
    pub async fn resync_all_agents(&self) -> Result<ResyncReport> {
        trace!("Entering resync_all_agents function");

        let agent_ids: Vec<i32> = agent_account::Entity::find()
            .select_only()
            .column(agent_account::Column::Id)
            .order_by_asc(agent_account::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut report = ResyncReport::default();
        for agent_id in agent_ids {
            match self.resync_earnings(agent_id).await {
                Ok(outcome) => {
                    report.processed += 1;
                    if !outcome.adjustment.is_zero() {
                        report.adjusted += 1;
                    }
                }
                Err(e) => {
                    error!("Resync of agent {} failed: {}", agent_id, e);
                    report.failed.push(ResyncFailure {
                        agent_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Resynced {} agents, {} adjusted, {} failed",
            report.processed,
            report.adjusted,
            report.failed.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::testing::{at, dec, init_test_tracing, seed_balance, setup_ledger};
    use model::HistoryAction;
    use model::entities::history_log;
    use sea_orm::sea_query::Expr;
    use sea_orm::{ActiveModelTrait, PaginatorTrait};

    async fn work(ledger: &Ledger, clock: &crate::FixedClock, agent_id: i32, day: u32, hours: u32) {
        clock.set(at(2024, 5, day, 9, 0));
        ledger.clock_in(agent_id).await.unwrap();
        clock.set(at(2024, 5, day, 9 + hours, 0));
        ledger.clock_out(agent_id).await.unwrap();
    }

    async fn balance_changes(ledger: &Ledger) -> u64 {
        history_log::Entity::find()
            .filter(history_log::Column::ActionType.eq(HistoryAction::BalanceChange))
            .count(ledger.db())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_resync_without_drift_is_a_no_op() {
        let (ledger, clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("20.00")).await.unwrap();
        work(&ledger, &clock, agent.agent_id, 6, 2).await;
        work(&ledger, &clock, agent.agent_id, 7, 3).await;

        let before = balance_changes(&ledger).await;
        let first = ledger.resync_earnings(agent.agent_id).await.unwrap();
        assert_eq!(first.adjustment, Decimal::ZERO);
        assert_eq!(first.recomputed_total, dec("100.00"));
        assert_eq!(first.available_balance, dec("100.00"));

        let second = ledger.resync_earnings(agent.agent_id).await.unwrap();
        assert_eq!(second.adjustment, Decimal::ZERO);
        assert_eq!(balance_changes(&ledger).await, before);
    }

    #[tokio::test]
    async fn test_resync_books_drift_once() {
        let (ledger, clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("20.00")).await.unwrap();
        work(&ledger, &clock, agent.agent_id, 6, 2).await;

        // A correction raised the day's record from 40.00 to 55.00.
        daily_earnings::Entity::update_many()
            .col_expr(daily_earnings::Column::TotalEarnings, Expr::value(dec("55.00")))
            .exec(ledger.db())
            .await
            .unwrap();

        let outcome = ledger.resync_earnings(agent.agent_id).await.unwrap();
        assert_eq!(outcome.previous_total, dec("40.00"));
        assert_eq!(outcome.recomputed_total, dec("55.00"));
        assert_eq!(outcome.adjustment, dec("15.00"));
        assert_eq!(outcome.available_balance, dec("55.00"));

        let again = ledger.resync_earnings(agent.agent_id).await.unwrap();
        assert_eq!(again.adjustment, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_resync_reverses_unrecorded_credit() {
        let (ledger, _clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("20.00")).await.unwrap();
        seed_balance(&ledger, agent.agent_id, dec("12.50")).await;

        let outcome = ledger.resync_earnings(agent.agent_id).await.unwrap();
        assert_eq!(outcome.adjustment, dec("-12.50"));
        assert_eq!(outcome.available_balance, Decimal::ZERO);
        assert_eq!(outcome.current_month_earnings, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_month_earnings_count_only_current_month() {
        let (ledger, clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("10.00")).await.unwrap();
        work(&ledger, &clock, agent.agent_id, 6, 4).await;

        daily_earnings::ActiveModel {
            agent_id: Set(agent.agent_id),
            date: Set(at(2024, 4, 30, 0, 0).date()),
            work_hours: Set(dec("1.00")),
            hourly_rate: Set(dec("10.00")),
            base_earnings: Set(dec("10.00")),
            commission_earnings: Set(Decimal::ZERO),
            bonus_earnings: Set(Decimal::ZERO),
            total_earnings: Set(dec("10.00")),
            clock_in_time: Set(None),
            clock_out_time: Set(None),
            created_at: Set(at(2024, 4, 30, 18, 0)),
            updated_at: Set(at(2024, 4, 30, 18, 0)),
            ..Default::default()
        }
        .insert(ledger.db())
        .await
        .unwrap();

        let outcome = ledger.resync_earnings(agent.agent_id).await.unwrap();
        assert_eq!(outcome.recomputed_total, dec("50.00"));
        assert_eq!(outcome.current_month_earnings, dec("40.00"));
        assert_eq!(outcome.adjustment, dec("10.00"));

        let summary = ledger.account_summary(agent.agent_id).await.unwrap();
        assert_eq!(summary.current_month_earnings, dec("40.00"));
        assert_eq!(summary.total_earnings, dec("50.00"));
    }

    #[tokio::test]
    async fn test_resync_all_isolates_failures() {
        let _guard = init_test_tracing();
        let (ledger, clock) = setup_ledger().await;
        let broken = ledger.register_agent("Ada", dec("20.00")).await.unwrap();
        let healthy = ledger.register_agent("Bob", dec("20.00")).await.unwrap();
        work(&ledger, &clock, broken.agent_id, 6, 2).await;
        seed_balance(&ledger, healthy.agent_id, dec("7.00")).await;

        // The money was already paid out, then the record was voided.
        agent_account::Entity::update_many()
            .col_expr(agent_account::Column::AvailableBalance, Expr::value(dec("5.00")))
            .filter(agent_account::Column::Id.eq(broken.agent_id))
            .exec(ledger.db())
            .await
            .unwrap();
        daily_earnings::Entity::delete_many()
            .exec(ledger.db())
            .await
            .unwrap();

        let err = ledger.resync_earnings(broken.agent_id).await.unwrap_err();
        assert!(matches!(err, LedgerError::NegativeBalance { .. }));

        let report = ledger.resync_all_agents().await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.adjusted, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].agent_id, broken.agent_id);

        let broken_summary = ledger.account_summary(broken.agent_id).await.unwrap();
        assert_eq!(broken_summary.available_balance, dec("5.00"));
        assert_eq!(broken_summary.total_earnings, dec("40.00"));
        let healthy_summary = ledger.account_summary(healthy.agent_id).await.unwrap();
        assert_eq!(healthy_summary.available_balance, Decimal::ZERO);
    }
}
