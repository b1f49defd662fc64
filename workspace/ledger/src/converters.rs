//! Mapping from stored rows to the projection types in `common`.

use common::{
    AccountSummary, AttendanceRecord, AttendanceState, BalanceEntry, WithdrawalState,
    WithdrawalView,
};
use model::entities::{agent_account, history_log, withdrawal_request};
use model::{AttendanceStatus, WithdrawalStatus};

pub fn attendance_state(status: AttendanceStatus) -> AttendanceState {
    match status {
        AttendanceStatus::NotClocked => AttendanceState::NotClocked,
        AttendanceStatus::ClockedIn => AttendanceState::ClockedIn,
        AttendanceStatus::ClockedOut => AttendanceState::ClockedOut,
    }
}

pub fn withdrawal_state(status: WithdrawalStatus) -> WithdrawalState {
    match status {
        WithdrawalStatus::Pending => WithdrawalState::Pending,
        WithdrawalStatus::Approved => WithdrawalState::Approved,
        WithdrawalStatus::Rejected => WithdrawalState::Rejected,
        WithdrawalStatus::Completed => WithdrawalState::Completed,
    }
}

pub fn withdrawal_status(state: WithdrawalState) -> WithdrawalStatus {
    match state {
        WithdrawalState::Pending => WithdrawalStatus::Pending,
        WithdrawalState::Approved => WithdrawalStatus::Approved,
        WithdrawalState::Rejected => WithdrawalStatus::Rejected,
        WithdrawalState::Completed => WithdrawalStatus::Completed,
    }
}

pub fn account_summary(account: &agent_account::Model) -> AccountSummary {
    AccountSummary {
        agent_id: account.id,
        name: account.name.clone(),
        hourly_rate: account.hourly_rate,
        available_balance: account.available_balance,
        total_earnings: account.total_earnings,
        current_month_earnings: account.current_month_earnings,
        pending_withdrawals: account.pending_withdrawals,
        total_withdrawals: account.total_withdrawals,
        total_withdrawn: account.total_withdrawn,
    }
}

/// A `clock_in` row is an open session; a `clock_out` row is a finished one.
pub fn attendance_record(row: history_log::Model) -> AttendanceRecord {
    AttendanceRecord {
        id: row.id,
        agent_id: row.agent_id,
        date: row.action_date,
        clock_in_time: row.clock_in_time,
        clock_out_time: row.clock_out_time,
        work_hours: row.work_hours,
        earnings: row.amount,
        description: row.description,
    }
}

pub fn balance_entry(row: history_log::Model) -> BalanceEntry {
    BalanceEntry {
        id: row.id,
        agent_id: row.agent_id,
        date: row.action_date,
        time: row.action_time,
        amount: row.amount,
        balance_before: row.balance_before,
        balance_after: row.balance_after,
        description: row.description,
    }
}

pub fn withdrawal_view(request: withdrawal_request::Model) -> WithdrawalView {
    WithdrawalView {
        withdrawal_id: request.withdrawal_id,
        agent_id: request.agent_id,
        amount: request.amount,
        platform_fee: request.platform_fee,
        status: withdrawal_state(request.status),
        created_at: request.created_at,
        processed_at: request.processed_at,
        completed_at: request.completed_at,
        processed_by: request.processed_by,
        notes: request.notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_withdrawal_state_mapping_is_bijective() {
        for status in WithdrawalStatus::iter() {
            assert_eq!(withdrawal_status(withdrawal_state(status)), status);
        }
    }
}
