use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::agent_account;

/// The kind of action an audit row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum HistoryAction {
    #[sea_orm(string_value = "clock_in")]
    ClockIn,
    #[sea_orm(string_value = "clock_out")]
    ClockOut,
    #[sea_orm(string_value = "balance_change")]
    BalanceChange,
}

impl HistoryAction {
    /// Actions that describe attendance rather than money movement.
    pub fn attendance() -> [HistoryAction; 2] {
        [HistoryAction::ClockIn, HistoryAction::ClockOut]
    }
}

/// Append-only audit record of an attendance or balance-changing action.
///
/// Rows are written best-effort. The one permitted mutation is the clock-out
/// update that turns the day's `clock_in` row into the finished `clock_out` row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "history_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub agent_id: i32,
    pub action_type: HistoryAction,
    pub action_date: NaiveDate,
    pub action_time: NaiveDateTime,
    pub clock_in_time: Option<NaiveDateTime>,
    pub clock_out_time: Option<NaiveDateTime>,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))")]
    pub work_hours: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub balance_before: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub balance_after: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "agent_account::Entity",
        from = "Column::AgentId",
        to = "agent_account::Column::Id",
        on_delete = "Cascade"
    )]
    AgentAccount,
}

impl Related<agent_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgentAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
