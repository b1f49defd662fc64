use anyhow::Result;
use ledger::Ledger;
use serde_json::Value;
use tracing::warn;

use super::to_json;

pub async fn reset_today(ledger: &Ledger, agent_id: i32) -> Result<Value> {
    warn!("Operator reset of today's attendance for agent {}", agent_id);
    to_json(&ledger.reset_today(agent_id).await?)
}

pub async fn resync(ledger: &Ledger, agent_id: i32) -> Result<Value> {
    to_json(&ledger.resync_earnings(agent_id).await?)
}

pub async fn resync_all(ledger: &Ledger) -> Result<Value> {
    let report = ledger.resync_all_agents().await?;
    for failure in &report.failed {
        warn!("Agent {} was not resynced: {}", failure.agent_id, failure.error);
    }
    to_json(&report)
}
