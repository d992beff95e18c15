use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users { Table, Id, FirebaseUid, Email, Name, Role, CompanyName, Status, CreatedAt }

#[derive(DeriveIden)]
enum Sessions { Table, Id, UserId, CreatedAt, ExpiresAt, Ip, UserAgent }

#[derive(DeriveIden)]
enum Companies { Table, Name, OwnerEmail, Plan, Seats, ActiveUntil, CreatedAt, UpdatedAt }

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Companies::Table)
                .if_not_exists()
                .col(ColumnDef::new(Companies::Name).string_len(256).not_null().primary_key())
                .col(ColumnDef::new(Companies::OwnerEmail).string_len(320).not_null())
                .col(ColumnDef::new(Companies::Plan).string_len(16).not_null().default("free"))
                .col(ColumnDef::new(Companies::Seats).integer().not_null().default(0))
                .col(ColumnDef::new(Companies::ActiveUntil).timestamp_with_time_zone())
                .col(ColumnDef::new(Companies::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Companies::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Users::Table)
                .if_not_exists()
                .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Users::FirebaseUid).string_len(128).unique_key())
                .col(ColumnDef::new(Users::Email).string_len(320).not_null().unique_key())
                .col(ColumnDef::new(Users::Name).string_len(256))
                .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                .col(ColumnDef::new(Users::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(Users::Status).string_len(16).not_null())
                .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create().name("idx_users_company").table(Users::Table).col(Users::CompanyName).to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Sessions::Table)
                .if_not_exists()
                .col(ColumnDef::new(Sessions::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Sessions::UserId).uuid().not_null())
                .col(ColumnDef::new(Sessions::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Sessions::ExpiresAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Sessions::Ip).string_len(64))
                .col(ColumnDef::new(Sessions::UserAgent).text())
                .foreign_key(ForeignKey::create()
                    .name("fk_sessions_user")
                    .from(Sessions::Table, Sessions::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create().name("idx_sessions_user").table(Sessions::Table).col(Sessions::UserId).to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Sessions::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Companies::Table).to_owned()).await?;
        Ok(())
    }
}
