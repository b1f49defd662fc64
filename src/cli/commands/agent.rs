use anyhow::Result;
use ledger::Ledger;
use serde_json::Value;
use tracing::debug;

use super::to_json;
use crate::cli::AgentCommand;

pub async fn run(ledger: &Ledger, command: AgentCommand) -> Result<Value> {
    match command {
        AgentCommand::Add { name, rate } => {
            debug!("Registering agent {} at {}", name, rate);
            to_json(&ledger.register_agent(&name, rate).await?)
        }
        AgentCommand::Show { agent_id } => to_json(&ledger.account_summary(agent_id).await?),
        AgentCommand::SetRate { agent_id, rate } => {
            to_json(&ledger.set_hourly_rate(agent_id, rate).await?)
        }
    }
}
