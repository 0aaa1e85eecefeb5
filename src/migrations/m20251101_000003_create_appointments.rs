//! Migration: Create appointments table

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
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // Nullable: legacy rows without a center are surfaced as anomalies
                    .col(ColumnDef::new(Appointments::CenterId).big_integer().null())
                    .col(ColumnDef::new(Appointments::FirstName).string().not_null())
                    .col(ColumnDef::new(Appointments::LastName).string().not_null())
                    .col(ColumnDef::new(Appointments::Email).string().not_null())
                    .col(ColumnDef::new(Appointments::Phone).string().not_null())
                    .col(
                        ColumnDef::new(Appointments::AppointmentDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::AppointmentTime)
                            .time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Appointments::Reason).string().null())
                    .col(ColumnDef::new(Appointments::CancelToken).string().not_null())
                    .col(
                        ColumnDef::new(Appointments::NoShowReported)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Appointments::Reminder3hSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Appointments::Reminder3hSentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Appointments::Table, Appointments::CenterId)
                            .to(Centers::Table, Centers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one non-cancelled appointment per (center, date, time).
        // Partial indexes are not expressible through the index builder; both
        // PostgreSQL and SQLite accept this statement as written.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_slot \
                 ON appointments (center_id, appointment_date, appointment_time) \
                 WHERE status <> 'cancelled'",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_date")
                    .table(Appointments::Table)
                    .col(Appointments::AppointmentDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_status")
                    .table(Appointments::Table)
                    .col(Appointments::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appointments::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Appointments {
    Table,
    Id,
    #[iden = "center_id"]
    CenterId,
    #[iden = "first_name"]
    FirstName,
    #[iden = "last_name"]
    LastName,
    Email,
    Phone,
    #[iden = "appointment_date"]
    AppointmentDate,
    #[iden = "appointment_time"]
    AppointmentTime,
    Status,
    Reason,
    #[iden = "cancel_token"]
    CancelToken,
    #[iden = "no_show_reported"]
    NoShowReported,
    #[iden = "reminder_3h_sent"]
    Reminder3hSent,
    #[iden = "reminder_3h_sent_at"]
    Reminder3hSentAt,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
