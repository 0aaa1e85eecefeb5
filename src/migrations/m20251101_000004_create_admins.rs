//! Migration: Create admins table
//!
//! Admins are the recipients of notification fan-out. Authentication happens
//! upstream; this table only records who exists and who wants notifications.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Admins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Admins::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Admins::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Admins::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(Admins::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Admins::ReceivesNotifications)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Admins::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Admins::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Admins {
    Table,
    Id,
    Email,
    #[iden = "display_name"]
    DisplayName,
    #[iden = "is_active"]
    IsActive,
    #[iden = "receives_notifications"]
    ReceivesNotifications,
    #[iden = "created_at"]
    CreatedAt,
}
