//! Agent accounts: registration, rate changes and the locked read/write
//! helpers every other module goes through.

use common::AccountSummary;
use model::AttendanceStatus;
use model::entities::agent_account;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument, trace};

use crate::attendance::normalize_today;
use crate::converters::account_summary;
use crate::error::{LedgerError, Result};
use crate::money::{RoundMoney, month_start, validate_rate};
use crate::Ledger;

/// Reads an account with an exclusive row lock.
///
/// On PostgreSQL this is `SELECT ... FOR UPDATE`; SQLite has no row locks and
/// serializes writers on the database instead.
pub(crate) async fn lock_account<C: ConnectionTrait>(
    conn: &C,
    agent_id: i32,
) -> Result<agent_account::Model> {
    agent_account::Entity::find_by_id(agent_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .map(RoundMoney::rounded)
        .ok_or(LedgerError::AgentNotFound(agent_id))
}

/// Writes every column of `account` back to its row.
pub(crate) async fn save_account<C: ConnectionTrait>(
    conn: &C,
    account: &agent_account::Model,
) -> Result<()> {
    account
        .clone()
        .into_active_model()
        .reset_all()
        .update(conn)
        .await?;
    Ok(())
}

impl Ledger {
    /// Creates an account with zeroed counters.
    #[instrument(skip(self))]
    pub async fn register_agent(&self, name: &str, hourly_rate: Decimal) -> Result<AccountSummary> {
        trace!("Entering register_agent function");

        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput("agent name is empty".to_string()));
        }
        let hourly_rate = validate_rate(hourly_rate)?;
        let now = self.now();

        let account = agent_account::ActiveModel {
            name: Set(name.to_string()),
            hourly_rate: Set(hourly_rate),
            available_balance: Set(Decimal::ZERO),
            total_earnings: Set(Decimal::ZERO),
            current_month_earnings: Set(Decimal::ZERO),
            earnings_month: Set(month_start(now.date())),
            pending_withdrawals: Set(Decimal::ZERO),
            total_withdrawals: Set(Decimal::ZERO),
            total_withdrawn: Set(Decimal::ZERO),
            today_status: Set(AttendanceStatus::NotClocked),
            today_clock_in_time: Set(None),
            today_clock_out_time: Set(None),
            today_work_hours: Set(Decimal::ZERO),
            today_total_earnings: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?
        .rounded();

        info!("Registered agent {} ({})", account.id, account.name);
        Ok(account_summary(&account))
    }

    /// Changes the rate used by the agent's future clock-outs.
    #[instrument(skip(self))]
    pub async fn set_hourly_rate(
        &self,
        agent_id: i32,
        hourly_rate: Decimal,
    ) -> Result<AccountSummary> {
        trace!("Entering set_hourly_rate function");
        let hourly_rate = validate_rate(hourly_rate)?;

        let txn = self.db.begin().await?;
        let mut account = lock_account(&txn, agent_id).await?;
        debug!(
            "Changing hourly rate of agent {} from {} to {}",
            agent_id, account.hourly_rate, hourly_rate
        );

        account.hourly_rate = hourly_rate;
        account.updated_at = self.now();
        save_account(&txn, &account).await?;
        txn.commit().await?;

        info!("Hourly rate of agent {} set to {}", agent_id, hourly_rate);
        Ok(account_summary(&account))
    }

    /// Money counters of one agent, with any pending month rollover applied.
    #[instrument(skip(self))]
    pub async fn account_summary(&self, agent_id: i32) -> Result<AccountSummary> {
        trace!("Entering account_summary function");
        let account = self.refresh_account(agent_id).await?;
        Ok(account_summary(&account))
    }

    /// Reads an account without locking it and persists the day/month
    /// rollover if one is due.
    pub(crate) async fn refresh_account(&self, agent_id: i32) -> Result<agent_account::Model> {
        let txn = self.db.begin().await?;
        let mut account = agent_account::Entity::find_by_id(agent_id)
            .one(&txn)
            .await?
            .map(RoundMoney::rounded)
            .ok_or(LedgerError::AgentNotFound(agent_id))?;

        if normalize_today(&mut account, self.now()) {
            save_account(&txn, &account).await?;
        }
        txn.commit().await?;
        Ok(account)
    }
}
