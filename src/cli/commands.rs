pub mod agent;
pub mod attendance;
pub mod initdb;
pub mod maintenance;
pub mod withdraw;

pub use initdb::{connect, init_database};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Serializes a command result for printing.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
