//! Transport-layer types returned by the ledger.
//! These are the read projections and receipts an API layer wrapping the
//! ledger hands to its callers, so they stay free of any database types.

mod attendance;
mod settlement;

pub use attendance::{
    AttendanceRecord, AttendanceState, ClockInReceipt, ClockOutReceipt, ResetOutcome, TodayStatus,
};
pub use settlement::{
    AccountSummary, BalanceEntry, ResyncFailure, ResyncOutcome, ResyncReport, WithdrawalState,
    WithdrawalView,
};

use serde::{Deserialize, Serialize};

/// One page of a paginated projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// Records on this page
    pub records: Vec<T>,
    /// Number of records matching the query across all pages
    pub total: u64,
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    /// Number of pages needed to show `total` records.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }
}
