use model::WithdrawalStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of a [`LedgerError`], used by callers to map
/// failures onto their own response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any transaction was opened
    Validation,
    /// The current state does not allow the operation; the transaction was rolled back
    Conflict,
    /// The addressed agent or withdrawal does not exist
    NotFound,
    /// The datastore failed; nothing was committed and the call may be retried
    Infrastructure,
}

/// Error types for the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent {0} not found")]
    AgentNotFound(i32),

    #[error("Withdrawal {0} not found")]
    WithdrawalNotFound(String),

    #[error("Agent {0} is already clocked in")]
    AlreadyClockedIn(i32),

    #[error("Agent {0} has already clocked out today")]
    AlreadyClockedOut(i32),

    #[error("Agent {0} is not clocked in")]
    NotClockedIn(i32),

    #[error("Withdrawal {withdrawal_id} cannot be {action} while {from:?}")]
    InvalidTransition {
        withdrawal_id: String,
        from: WithdrawalStatus,
        action: &'static str,
    },

    #[error("A pending withdrawal of {amount} by agent {agent_id} was submitted moments ago")]
    DuplicateRequest { agent_id: i32, amount: Decimal },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    #[error("Applying {delta} to balance {balance} of agent {agent_id} would make it negative")]
    NegativeBalance {
        agent_id: i32,
        balance: Decimal,
        delta: Decimal,
    },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount(_) | LedgerError::InvalidInput(_) => ErrorKind::Validation,
            LedgerError::AgentNotFound(_) | LedgerError::WithdrawalNotFound(_) => {
                ErrorKind::NotFound
            }
            LedgerError::AlreadyClockedIn(_)
            | LedgerError::AlreadyClockedOut(_)
            | LedgerError::NotClockedIn(_)
            | LedgerError::InvalidTransition { .. }
            | LedgerError::DuplicateRequest { .. }
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::NegativeBalance { .. } => ErrorKind::Conflict,
            LedgerError::Database(_) => ErrorKind::Infrastructure,
        }
    }

    /// Whether repeating the same call could succeed without any change of state.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Infrastructure
    }
}

/// Type alias for Result with LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;
