use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use ledger::{FixedClock, Ledger, LedgerConfig};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Ledger over a fresh database with a clock stopped at 2024-05-06 09:00.
pub async fn setup_test_ledger() -> (Ledger, Arc<FixedClock>) {
    let db = setup_test_db().await;
    let clock = Arc::new(FixedClock::new(at(2024, 5, 6, 9, 0)));
    let ledger = Ledger::with_clock(db, LedgerConfig::default(), clock.clone());
    (ledger, clock)
}

/// Parses `args` as a command line and runs it against `ledger`.
pub async fn run_cli(ledger: &Ledger, args: &[&str]) -> anyhow::Result<Value> {
    let cli = Cli::try_parse_from(std::iter::once("shiftledger").chain(args.iter().copied()))?;
    cli.command.execute(ledger).await
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
