//! Attendance and earnings settlement for hourly agents.
//!
//! [`Ledger`] is the single entry point. Every mutating call runs as one
//! database transaction covering its read, check and write, so a failed call
//! leaves the store as it found it (apart from audit rows, which are
//! best-effort).

pub mod agents;
pub mod attendance;
pub mod audit;
pub mod balance;
pub mod clock;
pub mod config;
pub mod converters;
pub mod earnings;
pub mod error;
pub mod history;
pub mod money;
pub mod withdrawal;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, Result};
pub use history::HistoryQuery;
pub use withdrawal::WithdrawalQuery;

/// Handle to the ledger store plus the clock and tunables it runs with.
#[derive(Clone)]
pub struct Ledger {
    db: DatabaseConnection,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Creates a ledger reading the system clock in the configured timezone.
    pub fn new(db: DatabaseConnection, config: LedgerConfig) -> Self {
        let clock = Arc::new(SystemClock::new(config.utc_offset_minutes));
        Self::with_clock(db, config, clock)
    }

    pub fn with_clock(db: DatabaseConnection, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { db, config, clock }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }

    /// Rejects page requests outside `1..` / `1..=max_page_size`.
    fn check_page(&self, page: u64, page_size: u64) -> Result<()> {
        if page == 0 {
            return Err(LedgerError::InvalidInput("page numbers start at 1".to_string()));
        }
        if page_size == 0 || page_size > self.config.max_page_size {
            return Err(LedgerError::InvalidInput(format!(
                "page size must be between 1 and {}",
                self.config.max_page_size
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("config", &self.config).finish_non_exhaustive()
    }
}
