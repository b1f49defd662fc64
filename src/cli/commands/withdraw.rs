use anyhow::Result;
use ledger::{Ledger, WithdrawalQuery};
use serde_json::Value;

use super::to_json;
use crate::cli::WithdrawCommand;

pub async fn run(ledger: &Ledger, command: WithdrawCommand) -> Result<Value> {
    match command {
        WithdrawCommand::Request { agent_id, amount } => {
            to_json(&ledger.request_withdrawal(agent_id, amount).await?)
        }
        WithdrawCommand::Approve { withdrawal_id, approver } => {
            to_json(&ledger.approve_withdrawal(&withdrawal_id, approver).await?)
        }
        WithdrawCommand::Reject { withdrawal_id, approver, reason } => {
            to_json(&ledger.reject_withdrawal(&withdrawal_id, approver, &reason).await?)
        }
        WithdrawCommand::Complete { withdrawal_id, operator } => {
            to_json(&ledger.complete_withdrawal(&withdrawal_id, operator).await?)
        }
        WithdrawCommand::List { agent, status, paging } => {
            let query = WithdrawalQuery {
                agent_id: agent,
                status: status.map(Into::into),
                page: paging.page,
                page_size: paging.page_size,
            };
            to_json(&ledger.list_withdrawals(query).await?)
        }
    }
}
