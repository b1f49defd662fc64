use anyhow::Result;
use chrono::NaiveDate;
use ledger::{HistoryQuery, Ledger};
use serde_json::Value;

use super::to_json;
use crate::cli::Paging;

pub async fn clock_in(ledger: &Ledger, agent_id: i32) -> Result<Value> {
    to_json(&ledger.clock_in(agent_id).await?)
}

pub async fn clock_out(ledger: &Ledger, agent_id: i32) -> Result<Value> {
    to_json(&ledger.clock_out(agent_id).await?)
}

pub async fn status(ledger: &Ledger, agent_id: i32) -> Result<Value> {
    to_json(&ledger.today_status(agent_id).await?)
}

pub async fn history(
    ledger: &Ledger,
    agent_id: Option<i32>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    paging: Paging,
) -> Result<Value> {
    let query = HistoryQuery {
        agent_id,
        from,
        to,
        page: paging.page,
        page_size: paging.page_size,
    };
    to_json(&ledger.attendance_history(query).await?)
}

pub async fn balance_history(ledger: &Ledger, agent_id: i32, paging: Paging) -> Result<Value> {
    to_json(&ledger.balance_history(agent_id, paging.page, paging.page_size).await?)
}
