use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum PaymentLogs {
    Table,
    Id,
    CompanyName,
    OrderId,
    PaymentId,
    Plan,
    Seats,
    Months,
    Amount,
    Currency,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(PaymentLogs::Table)
                .if_not_exists()
                .col(ColumnDef::new(PaymentLogs::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(PaymentLogs::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(PaymentLogs::OrderId).string_len(64).not_null().unique_key())
                .col(ColumnDef::new(PaymentLogs::PaymentId).string_len(64))
                .col(ColumnDef::new(PaymentLogs::Plan).string_len(16).not_null())
                .col(ColumnDef::new(PaymentLogs::Seats).integer().not_null())
                .col(ColumnDef::new(PaymentLogs::Months).integer().not_null())
                .col(ColumnDef::new(PaymentLogs::Amount).big_integer().not_null())
                .col(ColumnDef::new(PaymentLogs::Currency).string_len(8).not_null())
                .col(ColumnDef::new(PaymentLogs::Status).string_len(16).not_null())
                .col(ColumnDef::new(PaymentLogs::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(PaymentLogs::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create().name("idx_payment_logs_company").table(PaymentLogs::Table).col(PaymentLogs::CompanyName).to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PaymentLogs::Table).to_owned()).await?;
        Ok(())
    }
}
