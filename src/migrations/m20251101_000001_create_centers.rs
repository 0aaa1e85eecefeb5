//! Migration: Create centers table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Centers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Centers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Centers::Name).string().not_null())
                    .col(ColumnDef::new(Centers::City).string().not_null())
                    .col(ColumnDef::new(Centers::Address).string().not_null())
                    .col(ColumnDef::new(Centers::Timezone).string().null())
                    .col(
                        ColumnDef::new(Centers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Centers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Centers::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Centers {
    Table,
    Id,
    Name,
    City,
    Address,
    Timezone,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
}
