use chrono::NaiveDateTime;
use model::entities::agent_account;
use rust_decimal::Decimal;
use sea_orm::DatabaseTransaction;
use tracing::{debug, warn};

use crate::agents::save_account;
use crate::audit::{BalanceChange, record_balance_change};
use crate::error::{LedgerError, Result};
use crate::money::round2;

/// Credits (or, with a negative `delta`, debits) earnings to a locked account.
///
/// Moves `available_balance`, `total_earnings` and `current_month_earnings` by
/// the same amount, writes the row and appends a `balance_change` audit entry.
/// Must be called inside the transaction that locked `account`; a balance that
/// would drop below zero fails with [`LedgerError::NegativeBalance`] and the
/// caller's transaction is expected to roll back.
pub(crate) async fn apply_earnings(
    txn: &DatabaseTransaction,
    account: &mut agent_account::Model,
    delta: Decimal,
    description: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let delta = round2(delta);
    let before = account.available_balance;
    let after = round2(before + delta);

    if after < Decimal::ZERO {
        warn!(
            "Rejecting earnings delta {} for agent {}: balance {} would go negative",
            delta, account.id, before
        );
        return Err(LedgerError::NegativeBalance {
            agent_id: account.id,
            balance: before,
            delta,
        });
    }

    account.available_balance = after;
    account.total_earnings = round2(account.total_earnings + delta);
    account.current_month_earnings = round2(account.current_month_earnings + delta);
    account.updated_at = now;
    save_account(txn, account).await?;
    debug!("Agent {} balance {} -> {} ({})", account.id, before, after, description);

    record_balance_change(
        txn,
        BalanceChange {
            agent_id: account.id,
            at: now,
            before,
            after,
            amount: delta,
            description,
        },
    )
    .await;
    Ok(())
}

/// Takes an approved withdrawal out of a locked account.
pub(crate) async fn deduct_withdrawal(
    txn: &DatabaseTransaction,
    account: &mut agent_account::Model,
    amount: Decimal,
    description: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let before = account.available_balance;
    if amount > before {
        return Err(LedgerError::InsufficientBalance {
            requested: amount,
            available: before,
        });
    }

    let after = round2(before - amount);
    account.available_balance = after;
    account.total_withdrawals = round2(account.total_withdrawals + amount);
    account.pending_withdrawals = round2(account.pending_withdrawals - amount).max(Decimal::ZERO);
    account.updated_at = now;
    save_account(txn, account).await?;
    debug!("Agent {} balance {} -> {} ({})", account.id, before, after, description);

    record_balance_change(
        txn,
        BalanceChange {
            agent_id: account.id,
            at: now,
            before,
            after,
            amount: -amount,
            description,
        },
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::lock_account;
    use crate::clock::Clock;
    use crate::testing::{dec, setup_ledger};
    use model::HistoryAction;
    use model::entities::history_log;
    use sea_orm::{EntityTrait, TransactionTrait};

    #[tokio::test]
    async fn test_apply_earnings_moves_all_counters() {
        let (ledger, clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("20.00")).await.unwrap();

        let txn = ledger.db().begin().await.unwrap();
        let mut account = lock_account(&txn, agent.agent_id).await.unwrap();
        apply_earnings(&txn, &mut account, dec("12.345"), "bonus", clock.now())
            .await
            .unwrap();
        txn.commit().await.unwrap();

        let summary = ledger.account_summary(agent.agent_id).await.unwrap();
        assert_eq!(summary.available_balance, dec("12.35"));
        assert_eq!(summary.total_earnings, dec("12.35"));
        assert_eq!(summary.current_month_earnings, dec("12.35"));

        let rows = history_log::Entity::find().all(ledger.db()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action_type, HistoryAction::BalanceChange);
        assert_eq!(rows[0].description.as_deref(), Some("bonus"));
    }

    #[tokio::test]
    async fn test_apply_earnings_refuses_negative_balance() {
        let (ledger, clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("20.00")).await.unwrap();

        let txn = ledger.db().begin().await.unwrap();
        let mut account = lock_account(&txn, agent.agent_id).await.unwrap();
        let err = apply_earnings(&txn, &mut account, dec("-0.01"), "correction", clock.now())
            .await
            .unwrap_err();
        txn.rollback().await.unwrap();

        assert!(matches!(err, LedgerError::NegativeBalance { .. }));
        let summary = ledger.account_summary(agent.agent_id).await.unwrap();
        assert_eq!(summary.available_balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_deduct_withdrawal_floors_pending_at_zero() {
        let (ledger, clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("20.00")).await.unwrap();

        let txn = ledger.db().begin().await.unwrap();
        let mut account = lock_account(&txn, agent.agent_id).await.unwrap();
        apply_earnings(&txn, &mut account, dec("50.00"), "seed", clock.now())
            .await
            .unwrap();
        deduct_withdrawal(&txn, &mut account, dec("30.00"), "payout", clock.now())
            .await
            .unwrap();
        txn.commit().await.unwrap();

        let summary = ledger.account_summary(agent.agent_id).await.unwrap();
        assert_eq!(summary.available_balance, dec("20.00"));
        assert_eq!(summary.total_withdrawals, dec("30.00"));
        assert_eq!(summary.pending_withdrawals, Decimal::ZERO);
        // Withdrawals do not reduce what was earned.
        assert_eq!(summary.total_earnings, dec("50.00"));
    }
}
