pub mod entities;

pub use entities::agent_account::AttendanceStatus;
pub use entities::history_log::HistoryAction;
pub use entities::withdrawal_request::WithdrawalStatus;
