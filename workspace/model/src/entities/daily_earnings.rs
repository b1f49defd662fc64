use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::agent_account;

/// Earnings snapshot for one agent on one calendar date.
/// There is at most one row per `(agent_id, date)`; clock-out upserts it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_earnings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub agent_id: i32,
    pub date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))")]
    pub work_hours: Decimal,
    /// Rate in effect when the day was settled.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub hourly_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub base_earnings: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub commission_earnings: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub bonus_earnings: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_earnings: Decimal,
    pub clock_in_time: Option<NaiveDateTime>,
    pub clock_out_time: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "agent_account::Entity",
        from = "Column::AgentId",
        to = "agent_account::Column::Id",
        on_delete = "Cascade"
    )]
    AgentAccount,
}

impl Related<agent_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgentAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttendanceStatus;
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection, Set};

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.expect("Migrations failed.");
        db
    }

    fn noon(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(12, 0, 0).unwrap()
    }

    async fn create_agent(db: &DatabaseConnection, date: NaiveDate) -> agent_account::Model {
        agent_account::ActiveModel {
            name: Set("Ada".to_string()),
            hourly_rate: Set(Decimal::new(2000, 2)),
            available_balance: Set(Decimal::ZERO),
            total_earnings: Set(Decimal::ZERO),
            current_month_earnings: Set(Decimal::ZERO),
            earnings_month: Set(date),
            pending_withdrawals: Set(Decimal::ZERO),
            total_withdrawals: Set(Decimal::ZERO),
            total_withdrawn: Set(Decimal::ZERO),
            today_status: Set(AttendanceStatus::NotClocked),
            today_clock_in_time: Set(None),
            today_clock_out_time: Set(None),
            today_work_hours: Set(Decimal::ZERO),
            today_total_earnings: Set(Decimal::ZERO),
            created_at: Set(noon(date)),
            updated_at: Set(noon(date)),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn record(agent_id: i32, date: NaiveDate, total: Decimal) -> ActiveModel {
        ActiveModel {
            agent_id: Set(agent_id),
            date: Set(date),
            work_hours: Set(Decimal::ONE),
            hourly_rate: Set(total),
            base_earnings: Set(total),
            commission_earnings: Set(Decimal::ZERO),
            bonus_earnings: Set(Decimal::ZERO),
            total_earnings: Set(total),
            clock_in_time: Set(None),
            clock_out_time: Set(None),
            created_at: Set(noon(date)),
            updated_at: Set(noon(date)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_one_record_per_agent_and_date() {
        let db = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let agent = create_agent(&db, date).await;

        record(agent.id, date, Decimal::new(1000, 2)).insert(&db).await.unwrap();
        let duplicate = record(agent.id, date, Decimal::new(2000, 2)).insert(&db).await;
        assert!(duplicate.is_err());

        // Another date is fine.
        let next = date.succ_opt().unwrap();
        record(agent.id, next, Decimal::new(2000, 2)).insert(&db).await.unwrap();

        let records = agent.find_related(Entity).all(&db).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
