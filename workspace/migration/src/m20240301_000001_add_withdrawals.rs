use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Create withdrawal_requests table
        manager
            .create_table(
                Table::create()
                    .table(WithdrawalRequests::Table)
                    .if_not_exists()
                    .col(string_len(WithdrawalRequests::WithdrawalId, 64).primary_key())
                    .col(integer(WithdrawalRequests::AgentId))
                    .col(decimal(WithdrawalRequests::Amount).decimal_len(16, 2))
                    .col(decimal(WithdrawalRequests::PlatformFee).decimal_len(16, 2).default(0))
                    .col(string_len(WithdrawalRequests::Status, 15).default("pending"))
                    .col(date_time(WithdrawalRequests::CreatedAt))
                    .col(date_time(WithdrawalRequests::UpdatedAt))
                    .col(date_time_null(WithdrawalRequests::ProcessedAt))
                    .col(date_time_null(WithdrawalRequests::CompletedAt))
                    .col(integer_null(WithdrawalRequests::ProcessedBy))
                    .col(string_null(WithdrawalRequests::Notes))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_withdrawal_requests_agent")
                            .from(WithdrawalRequests::Table, WithdrawalRequests::AgentId)
                            .to(Alias::new("agent_accounts"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_withdrawal_requests_agent_status")
                    .table(WithdrawalRequests::Table)
                    .col(WithdrawalRequests::AgentId)
                    .col(WithdrawalRequests::Status)
                    .to_owned(),
            )
            .await?;

        // 2. Withdrawal counters on agent_accounts, one column per statement for SQLite
        for column in ["pending_withdrawals", "total_withdrawals", "total_withdrawn"] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new("agent_accounts"))
                        .add_column(
                            ColumnDef::new(Alias::new(column))
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for column in ["total_withdrawn", "total_withdrawals", "pending_withdrawals"] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new("agent_accounts"))
                        .drop_column(Alias::new(column))
                        .to_owned(),
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(WithdrawalRequests::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum WithdrawalRequests {
    Table,
    WithdrawalId,
    AgentId,
    Amount,
    PlatformFee,
    Status,
    CreatedAt,
    UpdatedAt,
    ProcessedAt,
    CompletedAt,
    ProcessedBy,
    Notes,
}
