//! Test helpers for unit tests that need a database.

use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;
use crate::models::{admin, appointment, center, slot};

/// Create an in-memory SQLite database with the full schema
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub async fn seed_center(db: &DatabaseConnection, name: &str, is_active: bool) -> center::Model {
    center::ActiveModel {
        name: Set(name.to_string()),
        city: Set("Lyon".to_string()),
        address: Set("1 rue de la Gare".to_string()),
        timezone: Set(Some("UTC".to_string())),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_slot(
    db: &DatabaseConnection,
    center_id: i64,
    slot_date: NaiveDate,
    start: NaiveTime,
) -> slot::Model {
    let now = Utc::now();
    slot::ActiveModel {
        center_id: Set(center_id),
        slot_date: Set(slot_date),
        start_time: Set(start),
        end_time: Set(start + chrono::Duration::hours(2)),
        is_available: Set(true),
        max_appointments: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_appointment(
    db: &DatabaseConnection,
    center_id: Option<i64>,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    status: &str,
) -> appointment::Model {
    let now = Utc::now();
    appointment::ActiveModel {
        center_id: Set(center_id),
        first_name: Set("Jeanne".to_string()),
        last_name: Set("Dupont".to_string()),
        email: Set("jeanne@example.fr".to_string()),
        phone: Set("0600000000".to_string()),
        appointment_date: Set(appointment_date),
        appointment_time: Set(appointment_time),
        status: Set(status.to_string()),
        reason: Set(Some("suspension".to_string())),
        cancel_token: Set("0123456789abcdef0123456789abcdef".to_string()),
        no_show_reported: Set(false),
        reminder_3h_sent: Set(false),
        reminder_3h_sent_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_admin(db: &DatabaseConnection, email: &str, receives: bool) -> admin::Model {
    admin::ActiveModel {
        email: Set(email.to_string()),
        display_name: Set(email.to_string()),
        is_active: Set(true),
        receives_notifications: Set(receives),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
