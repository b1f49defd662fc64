use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::agent_account;

/// Settlement state of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum WithdrawalStatus {
    #[sea_orm(string_value = "pending")]
    Pending, // Waiting for an operator, balance untouched.
    #[sea_orm(string_value = "approved")]
    Approved, // Amount deducted from the balance.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "completed")]
    Completed, // Paid out.
}

impl WithdrawalStatus {
    /// Whether the amount has already been taken from the agent's balance.
    pub fn is_deducted(self) -> bool {
        match self {
            WithdrawalStatus::Approved | WithdrawalStatus::Completed => true,
            WithdrawalStatus::Pending | WithdrawalStatus::Rejected => false,
        }
    }
}

/// An agent's request to pay out part of the available balance.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "withdrawal_requests")]
pub struct Model {
    /// Opaque id handed to callers.
    #[sea_orm(primary_key, auto_increment = false)]
    pub withdrawal_id: String,
    pub agent_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub platform_fee: Decimal,
    pub status: WithdrawalStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub processed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    /// Operator who approved, rejected or completed the request.
    pub processed_by: Option<i32>,
    pub notes: Option<String>,
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
