pub use sea_orm_migration::prelude::*;

mod m20251101_000001_create_centers;
mod m20251101_000002_create_slots;
mod m20251101_000003_create_appointments;
mod m20251101_000004_create_admins;
mod m20251101_000005_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000001_create_centers::Migration),
            Box::new(m20251101_000002_create_slots::Migration),
            Box::new(m20251101_000003_create_appointments::Migration),
            Box::new(m20251101_000004_create_admins::Migration),
            Box::new(m20251101_000005_create_notifications::Migration),
        ]
    }
}
