use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Attendance state as reported to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    NotClocked,
    ClockedIn,
    ClockedOut,
}

/// Result of a successful clock-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockInReceipt {
    pub agent_id: i32,
    pub status: AttendanceState,
    pub clock_in_time: NaiveDateTime,
}

/// Result of a successful clock-out, including the settled earnings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockOutReceipt {
    pub agent_id: i32,
    pub work_hours: Decimal,
    pub hourly_rate: Decimal,
    pub earnings: Decimal,
    /// Available balance after the earnings were credited
    pub new_balance: Decimal,
}

/// Today's attendance view for one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodayStatus {
    pub agent_id: i32,
    pub date: NaiveDate,
    pub status: AttendanceState,
    pub clock_in_time: Option<NaiveDateTime>,
    pub clock_out_time: Option<NaiveDateTime>,
    /// Minutes worked so far (running while clocked in)
    pub work_duration_minutes: i64,
    pub work_hours: Decimal,
    /// Settled earnings after clock-out, a live estimate while clocked in
    pub earnings: Decimal,
}

/// One clock-in/clock-out pair from the attendance history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub id: i32,
    pub agent_id: i32,
    pub date: NaiveDate,
    pub clock_in_time: Option<NaiveDateTime>,
    /// `None` while the session is still open
    pub clock_out_time: Option<NaiveDateTime>,
    pub work_hours: Option<Decimal>,
    pub earnings: Option<Decimal>,
    pub description: Option<String>,
}

/// What an operator reset of today's attendance removed and corrected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResetOutcome {
    pub agent_id: i32,
    pub date: NaiveDate,
    pub removed_earnings_records: u64,
    pub removed_history_rows: u64,
    /// Balance correction applied by the follow-up resync
    pub balance_adjustment: Decimal,
    pub available_balance: Decimal,
}
