use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Withdrawal state as reported to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalState {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// A withdrawal request as seen by agents and operators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WithdrawalView {
    pub withdrawal_id: String,
    pub agent_id: i32,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub status: WithdrawalState,
    pub created_at: NaiveDateTime,
    pub processed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub processed_by: Option<i32>,
    pub notes: Option<String>,
}

/// Money counters of one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSummary {
    pub agent_id: i32,
    pub name: String,
    pub hourly_rate: Decimal,
    pub available_balance: Decimal,
    pub total_earnings: Decimal,
    pub current_month_earnings: Decimal,
    pub pending_withdrawals: Decimal,
    pub total_withdrawals: Decimal,
    pub total_withdrawn: Decimal,
}

/// One balance movement from the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceEntry {
    pub id: i32,
    pub agent_id: i32,
    pub date: NaiveDate,
    pub time: NaiveDateTime,
    pub amount: Option<Decimal>,
    pub balance_before: Option<Decimal>,
    pub balance_after: Option<Decimal>,
    pub description: Option<String>,
}

/// Result of recomputing one agent's earnings from the daily records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResyncOutcome {
    pub agent_id: i32,
    pub previous_total: Decimal,
    pub recomputed_total: Decimal,
    pub current_month_earnings: Decimal,
    /// Amount applied to the balance, zero when nothing had drifted
    pub adjustment: Decimal,
    pub available_balance: Decimal,
}

/// An agent whose resync failed during a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResyncFailure {
    pub agent_id: i32,
    pub error: String,
}

/// Summary of a resync across all agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResyncReport {
    pub processed: u64,
    pub adjusted: u64,
    pub failed: Vec<ResyncFailure>,
}
