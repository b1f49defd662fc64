use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Where an agent stands in today's clock-in/clock-out lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "not_clocked")]
    NotClocked, // Initial state of every day.
    #[sea_orm(string_value = "clocked_in")]
    ClockedIn,
    #[sea_orm(string_value = "clocked_out")]
    ClockedOut, // Terminal for the day, rolls back to NotClocked on the next date.
}

/// A staff account that clocks in and out and earns by the hour.
///
/// The row carries both the running money counters and the "today" attendance
/// fields. It is only ever mutated inside a transaction that has read it with an
/// exclusive lock.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "agent_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub hourly_rate: Decimal,
    /// Money the agent can withdraw. Never negative once committed.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub available_balance: Decimal,
    /// Lifetime earnings credited to the balance.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_earnings: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub current_month_earnings: Decimal,
    /// First day of the month `current_month_earnings` is counted for.
    pub earnings_month: NaiveDate,
    /// Sum of withdrawal requests still waiting for a decision.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub pending_withdrawals: Decimal,
    /// Lifetime amount deducted from the balance for withdrawals.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_withdrawals: Decimal,
    /// Lifetime amount of withdrawals marked as paid out.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_withdrawn: Decimal,
    pub today_status: AttendanceStatus,
    pub today_clock_in_time: Option<NaiveDateTime>,
    pub today_clock_out_time: Option<NaiveDateTime>,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))")]
    pub today_work_hours: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub today_total_earnings: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::daily_earnings::Entity")]
    DailyEarnings,
    #[sea_orm(has_many = "super::history_log::Entity")]
    HistoryLog,
    #[sea_orm(has_many = "super::withdrawal_request::Entity")]
    WithdrawalRequest,
}

impl Related<super::daily_earnings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyEarnings.def()
    }
}

impl Related<super::history_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HistoryLog.def()
    }
}

impl Related<super::withdrawal_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WithdrawalRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
