//! Migration: Create slots table
//!
//! One row per (center, date, start time); the unique index makes duplicate
//! slot rows impossible instead of something the sweeps must work around.

use sea_orm_migration::prelude::*;

use super::m20251101_000001_create_centers::Centers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Slots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Slots::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Slots::CenterId).big_integer().not_null())
                    .col(ColumnDef::new(Slots::SlotDate).date().not_null())
                    .col(ColumnDef::new(Slots::StartTime).time().not_null())
                    .col(ColumnDef::new(Slots::EndTime).time().not_null())
                    .col(
                        ColumnDef::new(Slots::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Slots::MaxAppointments)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Slots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Slots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Slots::Table, Slots::CenterId)
                            .to(Centers::Table, Centers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_slots_center_date_start_unique")
                    .table(Slots::Table)
                    .col(Slots::CenterId)
                    .col(Slots::SlotDate)
                    .col(Slots::StartTime)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Slots::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Slots {
    Table,
    Id,
    #[iden = "center_id"]
    CenterId,
    #[iden = "slot_date"]
    SlotDate,
    #[iden = "start_time"]
    StartTime,
    #[iden = "end_time"]
    EndTime,
    #[iden = "is_available"]
    IsAvailable,
    #[iden = "max_appointments"]
    MaxAppointments,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
