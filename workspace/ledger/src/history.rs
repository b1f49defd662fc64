//! Read projections over the history log.

use chrono::NaiveDate;
use common::{AttendanceRecord, BalanceEntry, Page};
use model::HistoryAction;
use model::entities::history_log;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument, trace};

use crate::converters::{attendance_record, balance_entry};
use crate::error::{LedgerError, Result};
use crate::money::RoundMoney;
use crate::Ledger;

/// Filter for [`Ledger::attendance_history`]. Dates are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub agent_id: Option<i32>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// 1-based
    pub page: u64,
    pub page_size: u64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            agent_id: None,
            from: None,
            to: None,
            page: 1,
            page_size: 20,
        }
    }
}

impl Ledger {
    /// Clock-in/clock-out sessions, newest first.
    #[instrument(skip(self))]
    pub async fn attendance_history(&self, query: HistoryQuery) -> Result<Page<AttendanceRecord>> {
        trace!("Entering attendance_history function");
        self.check_page(query.page, query.page_size)?;
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(LedgerError::InvalidInput(format!("date range {from}..{to} is empty")));
            }
        }

        let mut select = history_log::Entity::find()
            .filter(history_log::Column::ActionType.is_in(HistoryAction::attendance()));
        if let Some(agent_id) = query.agent_id {
            select = select.filter(history_log::Column::AgentId.eq(agent_id));
        }
        if let Some(from) = query.from {
            select = select.filter(history_log::Column::ActionDate.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(history_log::Column::ActionDate.lte(to));
        }

        let paginator = select
            .order_by_desc(history_log::Column::ActionDate)
            .order_by_desc(history_log::Column::Id)
            .paginate(&self.db, query.page_size);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(query.page - 1).await?;
        debug!("Fetched {} of {} attendance records", records.len(), total);

        Ok(Page {
            records: records
                .into_iter()
                .map(|row| attendance_record(row.rounded()))
                .collect(),
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    /// Balance movements of one agent, newest first.
    #[instrument(skip(self))]
    pub async fn balance_history(
        &self,
        agent_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<Page<BalanceEntry>> {
        trace!("Entering balance_history function");
        self.check_page(page, page_size)?;

        let paginator = history_log::Entity::find()
            .filter(history_log::Column::AgentId.eq(agent_id))
            .filter(history_log::Column::ActionType.eq(HistoryAction::BalanceChange))
            .order_by_desc(history_log::Column::ActionTime)
            .order_by_desc(history_log::Column::Id)
            .paginate(&self.db, page_size);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page - 1).await?;

        Ok(Page {
            records: records
                .into_iter()
                .map(|row| balance_entry(row.rounded()))
                .collect(),
            total,
            page,
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, dec, setup_ledger};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_attendance_history_filters_and_pages() {
        let (ledger, clock) = setup_ledger().await;
        let ada = ledger.register_agent("Ada", dec("20.00")).await.unwrap();
        let bob = ledger.register_agent("Bob", dec("15.00")).await.unwrap();

        for day in 6..=8 {
            clock.set(at(2024, 5, day, 9, 0));
            ledger.clock_in(ada.agent_id).await.unwrap();
            ledger.clock_in(bob.agent_id).await.unwrap();
            clock.set(at(2024, 5, day, 10, 0));
            ledger.clock_out(ada.agent_id).await.unwrap();
        }

        let all = ledger.attendance_history(HistoryQuery::default()).await.unwrap();
        assert_eq!(all.total, 6);

        let ada_page = ledger
            .attendance_history(HistoryQuery {
                agent_id: Some(ada.agent_id),
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ada_page.total, 3);
        assert_eq!(ada_page.total_pages(), 2);
        assert_eq!(ada_page.records.len(), 2);
        assert_eq!(ada_page.records[0].date, at(2024, 5, 8, 0, 0).date());
        assert_eq!(ada_page.records[0].work_hours, Some(dec("1.00")));
        assert_eq!(ada_page.records[0].earnings, Some(dec("20.00")));

        // Bob never clocked out, his sessions stay open.
        let bob_range = ledger
            .attendance_history(HistoryQuery {
                agent_id: Some(bob.agent_id),
                from: Some(at(2024, 5, 7, 0, 0).date()),
                to: Some(at(2024, 5, 7, 0, 0).date()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(bob_range.total, 1);
        assert_eq!(bob_range.records[0].clock_out_time, None);
    }

    #[tokio::test]
    async fn test_history_rejects_bad_paging() {
        let (ledger, _clock) = setup_ledger().await;

        let err = ledger
            .attendance_history(HistoryQuery {
                page: 0,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));

        let err = ledger.balance_history(1, 1, 1000).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));

        let day = at(2024, 5, 7, 0, 0).date();
        let err = ledger
            .attendance_history(HistoryQuery {
                from: Some(day),
                to: day.pred_opt(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_balance_history_lists_movements() {
        let (ledger, clock) = setup_ledger().await;
        let agent = ledger.register_agent("Ada", dec("20.00")).await.unwrap();

        clock.set(at(2024, 5, 6, 9, 0));
        ledger.clock_in(agent.agent_id).await.unwrap();
        clock.set(at(2024, 5, 6, 11, 30));
        ledger.clock_out(agent.agent_id).await.unwrap();

        let page = ledger.balance_history(agent.agent_id, 1, 10).await.unwrap();
        assert_eq!(page.total, 1);
        let entry = &page.records[0];
        assert_eq!(entry.amount, Some(dec("50.00")));
        assert_eq!(entry.balance_before, Some(Decimal::ZERO));
        assert_eq!(entry.balance_after, Some(dec("50.00")));
        assert_eq!(entry.time, at(2024, 5, 6, 11, 30));
    }
}
