//! Shared fixtures for integration tests.
//!
//! In-memory SQLite with the real migrations, seed helpers, and an email
//! sender double that records what it was asked to send.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tower::util::ServiceExt;

use centerbook::config::email::EmailConfig;
use centerbook::config::scheduling::SchedulingConfig;
use centerbook::config::security::SecurityConfig;
use centerbook::endpoints::create_router;
use centerbook::migrations::Migrator;
use centerbook::models::{admin, appointment, center, slot};
use centerbook::services::booking::{BookingRequest, CustomerDetails};
use centerbook::services::email::{EmailSender, EmailTemplate, SendResult};
use centerbook::models::appointment::AppointmentReason;
use centerbook::state::AppState;

pub const CRON_SECRET: &str = "test-cron-secret";

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

// ============================================================================
// Email double
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBehavior {
    Succeed,
    Fail,
    Hang(Duration),
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub template: EmailTemplate,
    pub recipient: String,
    pub variables: serde_json::Value,
}

pub struct RecordingEmailSender {
    behavior: Mutex<SendBehavior>,
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailSender {
    pub fn new(behavior: SendBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn set_behavior(&self, behavior: SendBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Successful sends only
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_with(&self, template: EmailTemplate) -> Vec<SentEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.template == template)
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient: &str,
        variables: &serde_json::Value,
    ) -> SendResult {
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            SendBehavior::Succeed => {
                self.sent.lock().unwrap().push(SentEmail {
                    template,
                    recipient: recipient.to_string(),
                    variables: variables.clone(),
                });
                SendResult::ok()
            }
            SendBehavior::Fail => SendResult::failed("provider returned 500"),
            SendBehavior::Hang(delay) => {
                tokio::time::sleep(delay).await;
                SendResult::ok()
            }
        }
    }
}

// ============================================================================
// Configuration & state
// ============================================================================

pub fn scheduling_config() -> SchedulingConfig {
    SchedulingConfig {
        default_timezone: "UTC".to_string(),
        status_grace: Duration::from_secs(5 * 60),
        reminder_lead: Duration::from_secs(3 * 60 * 60),
        reminder_window: Duration::from_secs(15 * 60),
        status_sweep_interval: Duration::from_secs(15 * 60),
        reminder_interval: Duration::from_secs(60 * 60),
        scheduler_enabled: false,
        auto_confirm: true,
    }
}

pub fn email_config() -> EmailConfig {
    EmailConfig {
        api_url: "http://127.0.0.1:9/unused".to_string(),
        api_key: None,
        sender_address: "no-reply@centerbook.test".to_string(),
        sender_name: "Centerbook".to_string(),
        send_timeout: Duration::from_millis(200),
        template_confirmation: Some(1),
        template_reminder: Some(2),
        template_cancellation: Some(3),
        public_url: "https://rdv.example.fr".to_string(),
    }
}

pub fn security_config() -> SecurityConfig {
    SecurityConfig {
        cron_secret: Some(CRON_SECRET.to_string()),
    }
}

pub fn build_state_with(
    db: DatabaseConnection,
    scheduling: SchedulingConfig,
    security: SecurityConfig,
) -> (AppState, Arc<RecordingEmailSender>) {
    let sender = RecordingEmailSender::new(SendBehavior::Succeed);
    let state = AppState::new(db, sender.clone(), &scheduling, &email_config(), security)
        .expect("UTC always resolves");
    (state, sender)
}

pub fn build_app_state(db: DatabaseConnection) -> (AppState, Arc<RecordingEmailSender>) {
    build_state_with(db, scheduling_config(), security_config())
}

pub fn build_app(db: DatabaseConnection) -> (Router, AppState, Arc<RecordingEmailSender>) {
    let (state, sender) = build_app_state(db);
    (create_router(state.clone()), state, sender)
}

// ============================================================================
// Seed data
// ============================================================================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub async fn seed_center(db: &DatabaseConnection, name: &str) -> center::Model {
    seed_center_with(db, name, true, Some("UTC")).await
}

pub async fn seed_center_with(
    db: &DatabaseConnection,
    name: &str,
    is_active: bool,
    timezone: Option<&str>,
) -> center::Model {
    center::ActiveModel {
        name: Set(name.to_string()),
        city: Set("Lyon".to_string()),
        address: Set("1 rue de la Gare".to_string()),
        timezone: Set(timezone.map(str::to_string)),
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

pub async fn seed_admin(db: &DatabaseConnection, email: &str) -> admin::Model {
    admin::ActiveModel {
        email: Set(email.to_string()),
        display_name: Set(email.to_string()),
        is_active: Set(true),
        receives_notifications: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Insert an appointment directly, bypassing the booking engine
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

pub fn booking_request(
    center_id: i64,
    booking_date: NaiveDate,
    booking_time: NaiveTime,
) -> BookingRequest {
    BookingRequest {
        center_id,
        date: booking_date,
        time: booking_time,
        customer: CustomerDetails {
            first_name: "Jeanne".to_string(),
            last_name: "Dupont".to_string(),
            email: "Jeanne.Dupont@example.fr".to_string(),
            phone: "0600000000".to_string(),
        },
        reason: AppointmentReason::Suspension,
    }
}

// ============================================================================
// HTTP helpers
// ============================================================================

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str, admin_id: i64, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-admin-id", admin_id.to_string());
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
