//! SeaORM entity modules for the attendance and settlement ledger.
//!
//! An agent account owns its daily earnings snapshots, its audit history and
//! its withdrawal requests. Every other table hangs off `agent_accounts`.

pub mod agent_account;
pub mod daily_earnings;
pub mod history_log;
pub mod withdrawal_request;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::agent_account::Entity as AgentAccount;
    pub use super::daily_earnings::Entity as DailyEarnings;
    pub use super::history_log::Entity as HistoryLog;
    pub use super::withdrawal_request::Entity as WithdrawalRequest;
}
