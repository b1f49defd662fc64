use chrono::Duration;
use rust_decimal::Decimal;

/// Tunables of the ledger. The binary fills this from its settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Offset of the business-day timezone from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Window in which a same-amount pending withdrawal counts as a resubmission.
    pub duplicate_window: Duration,
    /// Fraction of a withdrawal recorded as platform fee.
    pub platform_fee_rate: Decimal,
    /// Largest page a projection query may ask for.
    pub max_page_size: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            duplicate_window: Duration::minutes(5),
            platform_fee_rate: Decimal::ZERO,
            max_page_size: 100,
        }
    }
}
