//! Best-effort writes to the history log.
//!
//! Each write runs in its own savepoint inside the caller's transaction. A
//! failure rolls back to the savepoint, is logged, and is otherwise ignored,
//! so the balance or status change it describes still commits.

use chrono::{NaiveDate, NaiveDateTime};
use model::HistoryAction;
use model::entities::history_log;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, warn};

/// A balance movement to record.
#[derive(Debug, Clone)]
pub(crate) struct BalanceChange<'a> {
    pub agent_id: i32,
    pub at: NaiveDateTime,
    pub before: Decimal,
    pub after: Decimal,
    pub amount: Decimal,
    pub description: &'a str,
}

/// A finished attendance session to record.
#[derive(Debug, Clone)]
pub(crate) struct ClockOutEntry {
    pub agent_id: i32,
    pub date: NaiveDate,
    pub clock_in: NaiveDateTime,
    pub clock_out: NaiveDateTime,
    pub work_hours: Decimal,
    pub earnings: Decimal,
}

pub(crate) async fn record_clock_in(txn: &DatabaseTransaction, agent_id: i32, at: NaiveDateTime) {
    let Some(savepoint) = open_savepoint(txn, "clock_in").await else {
        return;
    };
    let result = history_log::ActiveModel {
        agent_id: Set(agent_id),
        action_type: Set(HistoryAction::ClockIn),
        action_date: Set(at.date()),
        action_time: Set(at),
        clock_in_time: Set(Some(at)),
        description: Set(Some("Clocked in".to_string())),
        ..Default::default()
    }
    .insert(&savepoint)
    .await
    .map(|_| ());
    close_savepoint(savepoint, "clock_in", result).await;
}

/// Turns the day's `clock_in` row into the finished `clock_out` row, or
/// inserts a fresh one if the clock-in row was never written.
pub(crate) async fn record_clock_out(txn: &DatabaseTransaction, entry: ClockOutEntry) {
    let Some(savepoint) = open_savepoint(txn, "clock_out").await else {
        return;
    };
    let result = write_clock_out(&savepoint, &entry).await;
    close_savepoint(savepoint, "clock_out", result).await;
}

async fn write_clock_out(
    savepoint: &DatabaseTransaction,
    entry: &ClockOutEntry,
) -> Result<(), DbErr> {
    let open = history_log::Entity::find()
        .filter(history_log::Column::AgentId.eq(entry.agent_id))
        .filter(history_log::Column::ActionDate.eq(entry.date))
        .filter(history_log::Column::ActionType.eq(HistoryAction::ClockIn))
        .order_by_desc(history_log::Column::Id)
        .one(savepoint)
        .await?;

    let description = format!("Worked {} h, earned {}", entry.work_hours, entry.earnings);
    match open {
        Some(row) => {
            let mut row: history_log::ActiveModel = row.into();
            row.action_type = Set(HistoryAction::ClockOut);
            row.action_time = Set(entry.clock_out);
            row.clock_out_time = Set(Some(entry.clock_out));
            row.work_hours = Set(Some(entry.work_hours));
            row.amount = Set(Some(entry.earnings));
            row.description = Set(Some(description));
            row.update(savepoint).await?;
        }
        None => {
            debug!(
                "No clock_in row for agent {} on {}, inserting clock_out row",
                entry.agent_id, entry.date
            );
            history_log::ActiveModel {
                agent_id: Set(entry.agent_id),
                action_type: Set(HistoryAction::ClockOut),
                action_date: Set(entry.date),
                action_time: Set(entry.clock_out),
                clock_in_time: Set(Some(entry.clock_in)),
                clock_out_time: Set(Some(entry.clock_out)),
                work_hours: Set(Some(entry.work_hours)),
                amount: Set(Some(entry.earnings)),
                description: Set(Some(description)),
                ..Default::default()
            }
            .insert(savepoint)
            .await?;
        }
    }
    Ok(())
}

pub(crate) async fn record_balance_change(txn: &DatabaseTransaction, change: BalanceChange<'_>) {
    let Some(savepoint) = open_savepoint(txn, "balance_change").await else {
        return;
    };
    let result = history_log::ActiveModel {
        agent_id: Set(change.agent_id),
        action_type: Set(HistoryAction::BalanceChange),
        action_date: Set(change.at.date()),
        action_time: Set(change.at),
        balance_before: Set(Some(change.before)),
        balance_after: Set(Some(change.after)),
        amount: Set(Some(change.amount)),
        description: Set(Some(change.description.to_string())),
        ..Default::default()
    }
    .insert(&savepoint)
    .await
    .map(|_| ());
    close_savepoint(savepoint, "balance_change", result).await;
}

async fn open_savepoint(txn: &DatabaseTransaction, what: &str) -> Option<DatabaseTransaction> {
    match txn.begin().await {
        Ok(savepoint) => Some(savepoint),
        Err(e) => {
            warn!("Skipping {} history entry, savepoint failed: {}", what, e);
            None
        }
    }
}

/// Releases the savepoint if the write succeeded, rolls back to it otherwise.
async fn close_savepoint(savepoint: DatabaseTransaction, what: &str, result: Result<(), DbErr>) {
    match result {
        Ok(()) => {
            if let Err(e) = savepoint.commit().await {
                warn!("Failed to release {} history savepoint: {}", what, e);
            }
        }
        Err(e) => {
            warn!("Failed to write {} history entry: {}", what, e);
            if let Err(e) = savepoint.rollback().await {
                warn!("Failed to roll back {} history savepoint: {}", what, e);
            }
        }
    }
}
