//! Withdrawal requests and their settlement.
//!
//! ```text
//! pending --approve--> approved --complete--> completed
//!    |  \------------------complete------------^
//!    \--reject--> rejected
//! ```
//!
//! The balance is reduced exactly once, when a request leaves `pending` for
//! `approved` or `completed`. Every transition reads the request under a lock
//! and then updates it only if it still has the status that was checked, so
//! two concurrent approvals cannot both deduct.

use common::{Page, WithdrawalState, WithdrawalView};
use model::WithdrawalStatus;
use model::entities::withdrawal_request;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use crate::agents::{lock_account, save_account};
use crate::balance::deduct_withdrawal;
use crate::converters::{withdrawal_status, withdrawal_view};
use crate::error::{LedgerError, Result};
use crate::money::{RoundMoney, round2, validate_amount};
use crate::Ledger;

/// Filter for [`Ledger::list_withdrawals`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalQuery {
    pub agent_id: Option<i32>,
    pub status: Option<WithdrawalState>,
    /// 1-based
    pub page: u64,
    pub page_size: u64,
}

impl Default for WithdrawalQuery {
    fn default() -> Self {
        Self {
            agent_id: None,
            status: None,
            page: 1,
            page_size: 20,
        }
    }
}

fn new_withdrawal_id() -> String {
    format!("WD{}", Uuid::new_v4().simple()).to_uppercase()
}

async fn lock_request(
    txn: &DatabaseTransaction,
    withdrawal_id: &str,
) -> Result<withdrawal_request::Model> {
    withdrawal_request::Entity::find_by_id(withdrawal_id.to_string())
        .lock_exclusive()
        .one(txn)
        .await?
        .map(RoundMoney::rounded)
        .ok_or_else(|| LedgerError::WithdrawalNotFound(withdrawal_id.to_string()))
}

/// Writes `changes` only if the request still has status `expected`.
async fn transition(
    txn: &DatabaseTransaction,
    request: &withdrawal_request::Model,
    expected: WithdrawalStatus,
    changes: withdrawal_request::ActiveModel,
    action: &'static str,
) -> Result<()> {
    let result = withdrawal_request::Entity::update_many()
        .set(changes)
        .filter(withdrawal_request::Column::WithdrawalId.eq(request.withdrawal_id.as_str()))
        .filter(withdrawal_request::Column::Status.eq(expected))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            "Withdrawal {} changed status under us, refusing to {}",
            request.withdrawal_id, action
        );
        return Err(LedgerError::InvalidTransition {
            withdrawal_id: request.withdrawal_id.clone(),
            from: request.status,
            action,
        });
    }
    Ok(())
}

fn invalid_transition(request: &withdrawal_request::Model, action: &'static str) -> LedgerError {
    warn!(
        "Withdrawal {} cannot be {} while {:?}",
        request.withdrawal_id, action, request.status
    );
    LedgerError::InvalidTransition {
        withdrawal_id: request.withdrawal_id.clone(),
        from: request.status,
        action,
    }
}

impl Ledger {
    /// Files a pending request. The balance is checked but not touched.
    #[instrument(skip(self))]
    pub async fn request_withdrawal(
        &self,
        agent_id: i32,
        amount: Decimal,
    ) -> Result<WithdrawalView> {
        trace!("Entering request_withdrawal function");
        let amount = validate_amount(amount)?;
        let now = self.now();

        let txn = self.db.begin().await?;
        let mut account = lock_account(&txn, agent_id).await?;

        // Compared here rather than in SQL: SQLite stores both columns as floats/text.
        let window_start = now - self.config.duplicate_window;
        let duplicate = withdrawal_request::Entity::find()
            .filter(withdrawal_request::Column::AgentId.eq(agent_id))
            .filter(withdrawal_request::Column::Status.eq(WithdrawalStatus::Pending))
            .all(&txn)
            .await?
            .into_iter()
            .map(RoundMoney::rounded)
            .any(|pending| pending.amount == amount && pending.created_at >= window_start);
        if duplicate {
            warn!("Duplicate withdrawal of {} by agent {}", amount, agent_id);
            return Err(LedgerError::DuplicateRequest { agent_id, amount });
        }

        if amount > account.available_balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: account.available_balance,
            });
        }

        let request = withdrawal_request::ActiveModel {
            withdrawal_id: Set(new_withdrawal_id()),
            agent_id: Set(agent_id),
            amount: Set(amount),
            platform_fee: Set(round2(amount * self.config.platform_fee_rate)),
            status: Set(WithdrawalStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            processed_at: Set(None),
            completed_at: Set(None),
            processed_by: Set(None),
            notes: Set(None),
        }
        .insert(&txn)
        .await?
        .rounded();

        account.pending_withdrawals = round2(account.pending_withdrawals + amount);
        account.updated_at = now;
        save_account(&txn, &account).await?;
        txn.commit().await?;

        info!("Agent {} requested withdrawal {} of {}", agent_id, request.withdrawal_id, amount);
        Ok(withdrawal_view(request))
    }

    /// Approves a pending request and deducts it from the balance.
    #[instrument(skip(self))]
    pub async fn approve_withdrawal(
        &self,
        withdrawal_id: &str,
        approver_id: i32,
    ) -> Result<WithdrawalView> {
        trace!("Entering approve_withdrawal function");
        let now = self.now();

        let txn = self.db.begin().await?;
        let mut request = lock_request(&txn, withdrawal_id).await?;
        if request.status != WithdrawalStatus::Pending {
            return Err(invalid_transition(&request, "approved"));
        }

        transition(
            &txn,
            &request,
            WithdrawalStatus::Pending,
            withdrawal_request::ActiveModel {
                status: Set(WithdrawalStatus::Approved),
                processed_by: Set(Some(approver_id)),
                processed_at: Set(Some(now)),
                updated_at: Set(now),
                ..Default::default()
            },
            "approved",
        )
        .await?;

        let mut account = lock_account(&txn, request.agent_id).await?;
        let description = format!("Withdrawal {} approved", request.withdrawal_id);
        deduct_withdrawal(&txn, &mut account, request.amount, &description, now).await?;
        txn.commit().await?;

        request.status = WithdrawalStatus::Approved;
        request.processed_by = Some(approver_id);
        request.processed_at = Some(now);
        request.updated_at = now;
        info!("Withdrawal {} approved by {}", withdrawal_id, approver_id);
        Ok(withdrawal_view(request))
    }

    /// Rejects a pending request. The balance was never touched.
    #[instrument(skip(self))]
    pub async fn reject_withdrawal(
        &self,
        withdrawal_id: &str,
        approver_id: i32,
        reason: &str,
    ) -> Result<WithdrawalView> {
        trace!("Entering reject_withdrawal function");
        let now = self.now();
        let reason = reason.trim();
        let notes = (!reason.is_empty()).then(|| reason.to_string());

        let txn = self.db.begin().await?;
        let mut request = lock_request(&txn, withdrawal_id).await?;
        if request.status != WithdrawalStatus::Pending {
            return Err(invalid_transition(&request, "rejected"));
        }

        transition(
            &txn,
            &request,
            WithdrawalStatus::Pending,
            withdrawal_request::ActiveModel {
                status: Set(WithdrawalStatus::Rejected),
                processed_by: Set(Some(approver_id)),
                processed_at: Set(Some(now)),
                updated_at: Set(now),
                notes: Set(notes.clone()),
                ..Default::default()
            },
            "rejected",
        )
        .await?;

        let mut account = lock_account(&txn, request.agent_id).await?;
        account.pending_withdrawals =
            round2(account.pending_withdrawals - request.amount).max(Decimal::ZERO);
        account.updated_at = now;
        save_account(&txn, &account).await?;
        txn.commit().await?;

        request.status = WithdrawalStatus::Rejected;
        request.processed_by = Some(approver_id);
        request.processed_at = Some(now);
        request.updated_at = now;
        request.notes = notes;
        info!("Withdrawal {} rejected by {}", withdrawal_id, approver_id);
        Ok(withdrawal_view(request))
    }

    /// Marks a request as paid out.
    ///
    /// A request that was never approved is approved in the same step, so its
    /// amount is deducted here instead.
    #[instrument(skip(self))]
    pub async fn complete_withdrawal(
        &self,
        withdrawal_id: &str,
        operator_id: Option<i32>,
    ) -> Result<WithdrawalView> {
        trace!("Entering complete_withdrawal function");
        let now = self.now();

        let txn = self.db.begin().await?;
        let mut request = lock_request(&txn, withdrawal_id).await?;
        let from = request.status;

        let mut changes = withdrawal_request::ActiveModel {
            status: Set(WithdrawalStatus::Completed),
            completed_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };
        match from {
            WithdrawalStatus::Pending => {
                changes.processed_at = Set(Some(now));
                changes.processed_by = Set(operator_id);
            }
            WithdrawalStatus::Approved => {
                if operator_id.is_some() {
                    changes.processed_by = Set(operator_id);
                }
            }
            WithdrawalStatus::Rejected | WithdrawalStatus::Completed => {
                return Err(invalid_transition(&request, "completed"));
            }
        }
        transition(&txn, &request, from, changes, "completed").await?;

        let mut account = lock_account(&txn, request.agent_id).await?;
        if !from.is_deducted() {
            debug!("Withdrawal {} completed without approval, deducting now", withdrawal_id);
            let description = format!("Withdrawal {} completed", request.withdrawal_id);
            deduct_withdrawal(&txn, &mut account, request.amount, &description, now).await?;
        }
        account.total_withdrawn = round2(account.total_withdrawn + request.amount);
        account.updated_at = now;
        save_account(&txn, &account).await?;
        txn.commit().await?;

        if from == WithdrawalStatus::Pending {
            request.processed_at = Some(now);
            request.processed_by = operator_id;
        } else if operator_id.is_some() {
            request.processed_by = operator_id;
        }
        request.status = WithdrawalStatus::Completed;
        request.completed_at = Some(now);
        request.updated_at = now;
        info!("Withdrawal {} completed", withdrawal_id);
        Ok(withdrawal_view(request))
    }

    #[instrument(skip(self))]
    pub async fn get_withdrawal(&self, withdrawal_id: &str) -> Result<WithdrawalView> {
        withdrawal_request::Entity::find_by_id(withdrawal_id.to_string())
            .one(&self.db)
            .await?
            .map(|request| withdrawal_view(request.rounded()))
            .ok_or_else(|| LedgerError::WithdrawalNotFound(withdrawal_id.to_string()))
    }

    /// Withdrawal requests, newest first.
    #[instrument(skip(self))]
    pub async fn list_withdrawals(&self, query: WithdrawalQuery) -> Result<Page<WithdrawalView>> {
        trace!("Entering list_withdrawals function");
        self.check_page(query.page, query.page_size)?;

        let mut select = withdrawal_request::Entity::find();
        if let Some(agent_id) = query.agent_id {
            select = select.filter(withdrawal_request::Column::AgentId.eq(agent_id));
        }
        if let Some(state) = query.status {
            select = select.filter(withdrawal_request::Column::Status.eq(withdrawal_status(state)));
        }

        let paginator = select
            .order_by_desc(withdrawal_request::Column::CreatedAt)
            .order_by_asc(withdrawal_request::Column::WithdrawalId)
            .paginate(&self.db, query.page_size);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(query.page - 1).await?;

        Ok(Page {
            records: records
                .into_iter()
                .map(|request| withdrawal_view(request.rounded()))
                .collect(),
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }
}
