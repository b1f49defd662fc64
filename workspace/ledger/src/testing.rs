//! Shared fixtures for the ledger's unit tests.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::{FixedClock, Ledger, LedgerConfig};

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None).await.expect("Migrations failed.");
    db
}

/// A migrated in-memory ledger whose clock starts at Monday 2024-05-06 08:00.
pub async fn setup_ledger() -> (Ledger, Arc<FixedClock>) {
    setup_ledger_with(LedgerConfig::default()).await
}

pub async fn setup_ledger_with(config: LedgerConfig) -> (Ledger, Arc<FixedClock>) {
    let db = setup_db().await;
    let clock = Arc::new(FixedClock::new(at(2024, 5, 6, 8, 0)));
    let ledger = Ledger::with_clock(db, config, clock.clone());
    (ledger, clock)
}

/// A migrated ledger backed by a SQLite file, so concurrent calls get their own
/// connections. Keep the returned directory alive for the test's duration.
pub async fn setup_file_ledger() -> (Ledger, Arc<FixedClock>, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.db").display());
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to file database");
    Migrator::up(&db, None).await.expect("Migrations failed.");

    let clock = Arc::new(FixedClock::new(at(2024, 5, 6, 8, 0)));
    let ledger = Ledger::with_clock(db, LedgerConfig::default(), clock.clone());
    (ledger, clock, dir)
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level comes from RUST_LOG and defaults to WARN.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Credits `amount` to an agent outside of any attendance flow.
pub async fn seed_balance(ledger: &Ledger, agent_id: i32, amount: Decimal) {
    use sea_orm::TransactionTrait;

    let txn = ledger.db().begin().await.unwrap();
    let mut account = crate::agents::lock_account(&txn, agent_id).await.unwrap();
    crate::balance::apply_earnings(&txn, &mut account, amount, "seed", ledger.now())
        .await
        .unwrap();
    txn.commit().await.unwrap();
}
