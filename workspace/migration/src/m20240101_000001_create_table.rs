use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create agent_accounts table
        manager
            .create_table(
                Table::create()
                    .table(AgentAccounts::Table)
                    .if_not_exists()
                    .col(pk_auto(AgentAccounts::Id))
                    .col(string(AgentAccounts::Name))
                    .col(decimal(AgentAccounts::HourlyRate).decimal_len(16, 2))
                    .col(decimal(AgentAccounts::AvailableBalance).decimal_len(16, 2).default(0))
                    .col(decimal(AgentAccounts::TotalEarnings).decimal_len(16, 2).default(0))
                    .col(decimal(AgentAccounts::CurrentMonthEarnings).decimal_len(16, 2).default(0))
                    .col(date(AgentAccounts::EarningsMonth))
                    .col(string_len(AgentAccounts::TodayStatus, 20).default("not_clocked"))
                    .col(date_time_null(AgentAccounts::TodayClockInTime))
                    .col(date_time_null(AgentAccounts::TodayClockOutTime))
                    .col(decimal(AgentAccounts::TodayWorkHours).decimal_len(8, 2).default(0))
                    .col(decimal(AgentAccounts::TodayTotalEarnings).decimal_len(16, 2).default(0))
                    .col(date_time(AgentAccounts::CreatedAt))
                    .col(date_time(AgentAccounts::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create daily_earnings table
        manager
            .create_table(
                Table::create()
                    .table(DailyEarnings::Table)
                    .if_not_exists()
                    .col(pk_auto(DailyEarnings::Id))
                    .col(integer(DailyEarnings::AgentId))
                    .col(date(DailyEarnings::Date))
                    .col(decimal(DailyEarnings::WorkHours).decimal_len(8, 2))
                    .col(decimal(DailyEarnings::HourlyRate).decimal_len(16, 2))
                    .col(decimal(DailyEarnings::BaseEarnings).decimal_len(16, 2))
                    .col(decimal(DailyEarnings::CommissionEarnings).decimal_len(16, 2).default(0))
                    .col(decimal(DailyEarnings::BonusEarnings).decimal_len(16, 2).default(0))
                    .col(decimal(DailyEarnings::TotalEarnings).decimal_len(16, 2))
                    .col(date_time_null(DailyEarnings::ClockInTime))
                    .col(date_time_null(DailyEarnings::ClockOutTime))
                    .col(date_time(DailyEarnings::CreatedAt))
                    .col(date_time(DailyEarnings::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_earnings_agent")
                            .from(DailyEarnings::Table, DailyEarnings::AgentId)
                            .to(AgentAccounts::Table, AgentAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One snapshot per agent per calendar date, also the upsert conflict target
        manager
            .create_index(
                Index::create()
                    .name("ux_daily_earnings_agent_date")
                    .table(DailyEarnings::Table)
                    .col(DailyEarnings::AgentId)
                    .col(DailyEarnings::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create history_log table
        manager
            .create_table(
                Table::create()
                    .table(HistoryLog::Table)
                    .if_not_exists()
                    .col(pk_auto(HistoryLog::Id))
                    .col(integer(HistoryLog::AgentId))
                    .col(string_len(HistoryLog::ActionType, 20))
                    .col(date(HistoryLog::ActionDate))
                    .col(date_time(HistoryLog::ActionTime))
                    .col(date_time_null(HistoryLog::ClockInTime))
                    .col(date_time_null(HistoryLog::ClockOutTime))
                    .col(decimal_null(HistoryLog::WorkHours).decimal_len(8, 2))
                    .col(decimal_null(HistoryLog::BalanceBefore).decimal_len(16, 2))
                    .col(decimal_null(HistoryLog::BalanceAfter).decimal_len(16, 2))
                    .col(decimal_null(HistoryLog::Amount).decimal_len(16, 2))
                    .col(string_null(HistoryLog::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_history_log_agent")
                            .from(HistoryLog::Table, HistoryLog::AgentId)
                            .to(AgentAccounts::Table, AgentAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_history_log_agent_date")
                    .table(HistoryLog::Table)
                    .col(HistoryLog::AgentId)
                    .col(HistoryLog::ActionDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(HistoryLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(DailyEarnings::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AgentAccounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AgentAccounts {
    Table,
    Id,
    Name,
    HourlyRate,
    AvailableBalance,
    TotalEarnings,
    CurrentMonthEarnings,
    EarningsMonth,
    TodayStatus,
    TodayClockInTime,
    TodayClockOutTime,
    TodayWorkHours,
    TodayTotalEarnings,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DailyEarnings {
    Table,
    Id,
    AgentId,
    Date,
    WorkHours,
    HourlyRate,
    BaseEarnings,
    CommissionEarnings,
    BonusEarnings,
    TotalEarnings,
    ClockInTime,
    ClockOutTime,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum HistoryLog {
    Table,
    Id,
    AgentId,
    ActionType,
    ActionDate,
    ActionTime,
    ClockInTime,
    ClockOutTime,
    WorkHours,
    BalanceBefore,
    BalanceAfter,
    Amount,
    Description,
}
