//! Booking engine.
//!
//! A booking is accepted only when the slot exists, is enabled, and no
//! non-cancelled appointment holds the same (center, date, time). The check
//! and the insert run in one transaction, and the partial unique index on
//! `appointments` settles any race the check cannot see.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use jiff::tz::TimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;
use crate::models::appointment::{AppointmentReason, AppointmentStatus};
use crate::models::prelude::*;
use crate::services::appointments::{find_occupying, AppointmentStore, TransitionOutcome};
use crate::services::civil_time::{scheduled_instant, CivilTimeError, ZoneResolver};
use crate::services::email::{appointment_variables, mask_recipient, EmailTemplate, SharedEmailSender};
use crate::services::notification::{AppointmentEvent, NotificationService};
use crate::services::slots::is_unique_violation;
use crate::state::DbConn;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Invalid booking request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Center {0} not found")]
    CenterNotFound(i64),

    #[error("Center {0} is not accepting bookings")]
    CenterInactive(i64),

    #[error("No slot is configured for {date} at {time}")]
    SlotNotFound { date: NaiveDate, time: NaiveTime },

    #[error("Slot is no longer available")]
    SlotUnavailable,

    #[error("Slot {date} at {time} has already started")]
    SlotInPast { date: NaiveDate, time: NaiveTime },

    #[error("Appointment {0} not found")]
    AppointmentNotFound(i64),

    #[error("Invalid cancellation token")]
    InvalidCancelToken,

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: AppointmentStatus,
    },

    #[error("Cannot schedule appointment: {0}")]
    Schedule(#[from] CivilTimeError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Validation(errors) => AppError::Validation(errors),
            BookingError::CenterNotFound(_)
            | BookingError::SlotNotFound { .. }
            | BookingError::AppointmentNotFound(_) => AppError::NotFound(e.to_string()),
            BookingError::CenterInactive(_) | BookingError::SlotInPast { .. } => {
                AppError::BadRequest(e.to_string())
            }
            BookingError::SlotUnavailable | BookingError::InvalidTransition { .. } => {
                AppError::Conflict(e.to_string())
            }
            BookingError::InvalidCancelToken => AppError::Forbidden(e.to_string()),
            BookingError::Schedule(civil) => civil.into(),
            BookingError::Database(db) => AppError::Database(db),
        }
    }
}

impl From<AppError> for BookingError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Database(db) => BookingError::Database(db),
            other => BookingError::Database(DbErr::Custom(other.to_string())),
        }
    }
}

pub type BookingResult<T> = std::result::Result<T, BookingError>;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CustomerDetails {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookingRequest {
    pub center_id: i64,
    #[schema(value_type = String, example = "2025-11-19")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "16:20")]
    #[serde(deserialize_with = "deserialize_civil_time")]
    pub time: NaiveTime,
    #[validate(nested)]
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub reason: AppointmentReason,
}

/// Accepts `HH:MM` as well as `HH:MM:SS`
fn deserialize_civil_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone)]
pub struct BookingSettings {
    /// New bookings start `confirmed` instead of `pending`
    pub auto_confirm: bool,
    pub public_url: String,
    pub email_timeout: Duration,
    /// Zone for centers without their own
    pub default_zone: TimeZone,
}

#[derive(Clone)]
pub struct BookingService {
    db: DbConn,
    store: AppointmentStore,
    notification: NotificationService,
    email: SharedEmailSender,
    settings: BookingSettings,
}

impl BookingService {
    pub fn new(
        db: DbConn,
        notification: NotificationService,
        email: SharedEmailSender,
        settings: BookingSettings,
    ) -> Self {
        Self {
            store: AppointmentStore::new(db.clone()),
            db,
            notification,
            email,
            settings,
        }
    }

    pub async fn book(&self, request: BookingRequest) -> BookingResult<appointment::Model> {
        self.book_at(request, Utc::now()).await
    }

    /// Book as if the current instant were `now`
    pub async fn book_at(
        &self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> BookingResult<appointment::Model> {
        request.validate()?;
        let BookingRequest {
            center_id,
            date,
            time,
            customer,
            reason,
        } = request;

        let center = Center::find_by_id(center_id)
            .one(&self.db)
            .await?
            .ok_or(BookingError::CenterNotFound(center_id))?;
        if !center.is_active {
            return Err(BookingError::CenterInactive(center_id));
        }
        if self.scheduled_for(&center, date, time)? <= now {
            return Err(BookingError::SlotInPast { date, time });
        }

        let txn = self.db.begin().await?;

        let slot = Slot::find()
            .filter(slot::Column::CenterId.eq(center_id))
            .filter(slot::Column::SlotDate.eq(date))
            .filter(slot::Column::StartTime.eq(time))
            .one(&txn)
            .await?
            .ok_or(BookingError::SlotNotFound { date, time })?;

        if !slot.is_available {
            return Err(BookingError::SlotUnavailable);
        }
        if find_occupying(&txn, center_id, date, time).await?.is_some() {
            return Err(BookingError::SlotUnavailable);
        }

        let status = if self.settings.auto_confirm {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Pending
        };

        let model = appointment::ActiveModel {
            center_id: Set(Some(center_id)),
            first_name: Set(customer.first_name.trim().to_string()),
            last_name: Set(customer.last_name.trim().to_string()),
            email: Set(customer.email.trim().to_lowercase()),
            phone: Set(customer.phone.trim().to_string()),
            appointment_date: Set(date),
            appointment_time: Set(time),
            status: Set(status.as_str().to_string()),
            reason: Set(Some(reason.as_str().to_string())),
            cancel_token: Set(generate_cancel_token()),
            no_show_reported: Set(false),
            reminder_3h_sent: Set(false),
            reminder_3h_sent_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = match model.insert(&txn).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => return Err(BookingError::SlotUnavailable),
            Err(e) => return Err(e.into()),
        };

        txn.commit().await.map_err(|e| {
            if is_unique_violation(&e) {
                BookingError::SlotUnavailable
            } else {
                BookingError::Database(e)
            }
        })?;

        tracing::info!(
            appointment_id = created.id,
            center_id,
            date = %date,
            time = %time,
            status = %status,
            "Appointment booked"
        );

        self.notification
            .notify_or_log(&AppointmentEvent::Booked {
                appointment: created.clone(),
                center_name: center.name.clone(),
            })
            .await;
        self.send_best_effort(EmailTemplate::BookingConfirmation, &created, Some(&center))
            .await;

        Ok(created)
    }

    /// Customer cancellation, authorized by the token handed out at booking time
    pub async fn cancel(&self, appointment_id: i64, token: &str) -> BookingResult<appointment::Model> {
        let existing = self.load(appointment_id).await?;
        let token_ok: bool = existing.cancel_token.as_bytes().ct_eq(token.as_bytes()).into();
        if existing.cancel_token.is_empty() || !token_ok {
            return Err(BookingError::InvalidCancelToken);
        }
        self.change_status(existing, AppointmentStatus::Cancelled).await
    }

    pub async fn admin_cancel(&self, appointment_id: i64) -> BookingResult<appointment::Model> {
        let existing = self.load(appointment_id).await?;
        self.change_status(existing, AppointmentStatus::Cancelled).await
    }

    pub async fn confirm(&self, appointment_id: i64) -> BookingResult<appointment::Model> {
        let existing = self.load(appointment_id).await?;
        self.change_status(existing, AppointmentStatus::Confirmed).await
    }

    pub async fn report_no_show(&self, appointment_id: i64) -> BookingResult<appointment::Model> {
        self.report_no_show_at(appointment_id, Utc::now()).await
    }

    /// Record that the client did not show up. Only accepted once the
    /// scheduled moment has passed; the status itself moves on the next
    /// sweep, once the grace period is over.
    pub async fn report_no_show_at(
        &self,
        appointment_id: i64,
        now: DateTime<Utc>,
    ) -> BookingResult<appointment::Model> {
        let existing = self.load(appointment_id).await?;
        let rejected = || BookingError::InvalidTransition {
            from: existing.status.clone(),
            to: AppointmentStatus::NoShow,
        };
        if existing.status() != Some(AppointmentStatus::Confirmed) {
            return Err(rejected());
        }

        let center = match existing.center_id {
            Some(id) => Center::find_by_id(id).one(&self.db).await?,
            None => None,
        };
        let center = center.ok_or_else(rejected)?;
        let scheduled =
            self.scheduled_for(&center, existing.appointment_date, existing.appointment_time)?;
        if now < scheduled {
            return Err(rejected());
        }

        if !self.store.flag_no_show(appointment_id, now).await? {
            return Err(rejected());
        }

        tracing::info!(appointment_id, "No-show reported");
        self.load(appointment_id).await
    }

    fn scheduled_for(
        &self,
        center: &center::Model,
        date: NaiveDate,
        time: NaiveTime,
    ) -> BookingResult<DateTime<Utc>> {
        let tz = ZoneResolver::new(self.settings.default_zone.clone()).for_center(center)?;
        Ok(scheduled_instant(date, time, &tz)?)
    }

    async fn load(&self, appointment_id: i64) -> BookingResult<appointment::Model> {
        self.store
            .find(appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound(appointment_id))
    }

    async fn change_status(
        &self,
        existing: appointment::Model,
        to: AppointmentStatus,
    ) -> BookingResult<appointment::Model> {
        let invalid = || BookingError::InvalidTransition {
            from: existing.status.clone(),
            to,
        };

        let from = existing.status().ok_or_else(invalid)?;
        if !from.can_transition_to(to) {
            return Err(invalid());
        }

        let updated = match self.store.transition(existing.id, from, to, Utc::now()).await? {
            TransitionOutcome::Applied(updated) => updated,
            TransitionOutcome::Stale => return Err(invalid()),
        };

        tracing::info!(
            appointment_id = updated.id,
            from = %from,
            to = %to,
            "Appointment status changed"
        );

        self.notification
            .notify_or_log(&AppointmentEvent::StatusChanged {
                appointment: updated.clone(),
                from,
                to,
                automatic: false,
            })
            .await;

        if to == AppointmentStatus::Cancelled {
            let center = match updated.center_id {
                Some(id) => Center::find_by_id(id).one(&self.db).await.ok().flatten(),
                None => None,
            };
            self.send_best_effort(EmailTemplate::Cancellation, &updated, center.as_ref())
                .await;
        }

        Ok(updated)
    }

    /// Emails here are a courtesy; their failure never fails the operation
    async fn send_best_effort(
        &self,
        template: EmailTemplate,
        appointment: &appointment::Model,
        center: Option<&center::Model>,
    ) {
        let variables = appointment_variables(appointment, center, &self.settings.public_url);
        let send = self.email.send(template, &appointment.email, &variables);

        match tokio::time::timeout(self.settings.email_timeout, send).await {
            Ok(result) if result.success => {
                tracing::debug!(
                    appointment_id = appointment.id,
                    template = template.as_str(),
                    "Email sent"
                );
            }
            Ok(result) => {
                tracing::warn!(
                    appointment_id = appointment.id,
                    template = template.as_str(),
                    recipient = %mask_recipient(&appointment.email),
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Email send failed"
                );
            }
            Err(_) => {
                tracing::warn!(
                    appointment_id = appointment.id,
                    template = template.as_str(),
                    "Email send timed out"
                );
            }
        }
    }
}

/// 128 random bits, hex encoded
pub fn generate_cancel_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
