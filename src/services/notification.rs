//! Admin notification fan-out.
//!
//! Booking and status changes are turned into one inbox row per interested
//! admin (or a single broadcast row when no admin is registered). Clients poll
//! [`NotificationService::list`] and diff unread counts themselves; there is no
//! push channel and no cursor beyond `created_at` ordering.

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::error::Result;
use crate::models::appointment::{self, AppointmentStatus};
use crate::models::notification::{self, NotificationType};
use crate::models::prelude::*;
use crate::state::DbConn;

/// A state change worth telling admins about
#[derive(Debug, Clone)]
pub enum AppointmentEvent {
    Booked {
        appointment: appointment::Model,
        center_name: String,
    },
    StatusChanged {
        appointment: appointment::Model,
        from: AppointmentStatus,
        to: AppointmentStatus,
        /// Set by the sweep, as opposed to an admin or customer action
        automatic: bool,
    },
}

impl AppointmentEvent {
    pub fn appointment(&self) -> &appointment::Model {
        match self {
            AppointmentEvent::Booked { appointment, .. } => appointment,
            AppointmentEvent::StatusChanged { appointment, .. } => appointment,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppointmentEvent::Booked { .. } => "new_booking",
            AppointmentEvent::StatusChanged { .. } => "status_changed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl NotificationFilter {
    /// Maps the `is_read` query parameter
    pub fn from_is_read(is_read: Option<bool>) -> Self {
        match is_read {
            None => NotificationFilter::All,
            Some(false) => NotificationFilter::Unread,
            Some(true) => NotificationFilter::Read,
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    db: DbConn,
}

impl NotificationService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Record an event for every admin who receives notifications.
    /// Returns the number of rows created.
    pub async fn notify(&self, event: &AppointmentEvent) -> Result<usize> {
        let appt = event.appointment();
        let title = format_event_title(event);
        let message = format_event_message(event);
        let metadata = event_metadata(event).to_string();
        let link = format!("/admin/appointments/{}", appt.id);
        let now = Utc::now();

        let recipients: Vec<i64> = Admin::find()
            .filter(admin::Column::IsActive.eq(true))
            .filter(admin::Column::ReceivesNotifications.eq(true))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let build = |admin_id: Option<i64>| notification::ActiveModel {
            admin_id: Set(admin_id),
            notification_type: Set(NotificationType::Appointment.as_str().to_string()),
            title: Set(title.clone()),
            message: Set(message.clone()),
            link: Set(Some(link.clone())),
            is_read: Set(false),
            read_at: Set(None),
            metadata: Set(Some(metadata.clone())),
            created_at: Set(now),
            ..Default::default()
        };

        let rows: Vec<notification::ActiveModel> = if recipients.is_empty() {
            vec![build(None)]
        } else {
            recipients.iter().map(|id| build(Some(*id))).collect()
        };
        let created = rows.len();

        Notification::insert_many(rows).exec(&self.db).await?;

        tracing::debug!(
            appointment_id = appt.id,
            event = event.kind(),
            recipients = created,
            "Admin notifications created"
        );

        Ok(created)
    }

    /// Best-effort variant for callers whose own work already succeeded
    pub async fn notify_or_log(&self, event: &AppointmentEvent) {
        if let Err(e) = self.notify(event).await {
            tracing::warn!(
                appointment_id = event.appointment().id,
                error = %e,
                "Failed to create admin notification"
            );
        }
    }

    /// Inbox of one admin: own rows plus broadcast rows, newest first
    pub async fn list(
        &self,
        admin_id: i64,
        filter: NotificationFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<notification::Model>> {
        let mut query = Notification::find().filter(visible_to(admin_id));
        match filter {
            NotificationFilter::All => {}
            NotificationFilter::Unread => {
                query = query.filter(notification::Column::IsRead.eq(false));
            }
            NotificationFilter::Read => {
                query = query.filter(notification::Column::IsRead.eq(true));
            }
        }

        let notifications = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(notifications)
    }

    pub async fn total_count(&self, admin_id: i64) -> Result<u64> {
        let count = Notification::find()
            .filter(visible_to(admin_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn unread_count(&self, admin_id: i64) -> Result<u64> {
        let count = Notification::find()
            .filter(visible_to(admin_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Mark the given notifications read. Ids the admin cannot see are ignored.
    pub async fn mark_read(&self, admin_id: i64, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
            .filter(notification::Column::Id.is_in(ids.to_vec()))
            .filter(visible_to(admin_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn mark_all_read(&self, admin_id: i64) -> Result<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
            .filter(visible_to(admin_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

fn visible_to(admin_id: i64) -> Condition {
    Condition::any()
        .add(notification::Column::AdminId.eq(admin_id))
        .add(notification::Column::AdminId.is_null())
}

fn format_event_title(event: &AppointmentEvent) -> String {
    match event {
        AppointmentEvent::Booked { .. } => "New booking".to_string(),
        AppointmentEvent::StatusChanged { to, .. } => match to {
            AppointmentStatus::Pending => "Appointment pending".to_string(),
            AppointmentStatus::Confirmed => "Appointment confirmed".to_string(),
            AppointmentStatus::Completed => "Appointment completed".to_string(),
            AppointmentStatus::Cancelled => "Appointment cancelled".to_string(),
            AppointmentStatus::NoShow => "Client did not show up".to_string(),
        },
    }
}

fn format_event_message(event: &AppointmentEvent) -> String {
    let appt = event.appointment();
    let when = format!(
        "{} at {}",
        appt.appointment_date.format("%d/%m/%Y"),
        appt.appointment_time.format("%H:%M")
    );

    match event {
        AppointmentEvent::Booked { center_name, .. } => {
            format!("{} booked {} on {}", appt.client_name(), center_name, when)
        }
        AppointmentEvent::StatusChanged {
            from,
            to,
            automatic,
            ..
        } => {
            let by = if *automatic { " (automatic)" } else { "" };
            format!(
                "{} on {}: {} -> {}{}",
                appt.client_name(),
                when,
                from,
                to,
                by
            )
        }
    }
}

fn event_metadata(event: &AppointmentEvent) -> serde_json::Value {
    let appt = event.appointment();
    match event {
        AppointmentEvent::Booked { .. } => serde_json::json!({
            "appointment_id": appt.id,
            "center_id": appt.center_id,
            "event": event.kind(),
        }),
        AppointmentEvent::StatusChanged {
            from,
            to,
            automatic,
            ..
        } => serde_json::json!({
            "appointment_id": appt.id,
            "center_id": appt.center_id,
            "event": event.kind(),
            "from": from.as_str(),
            "to": to.as_str(),
            "automatic": automatic,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn sample_appointment() -> appointment::Model {
        appointment::Model {
            id: 42,
            center_id: Some(7),
            first_name: "Jeanne".to_string(),
            last_name: "Dupont".to_string(),
            email: "jeanne@example.fr".to_string(),
            phone: "+33600000000".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2025, 11, 19).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(16, 20, 0).unwrap(),
            status: "confirmed".to_string(),
            reason: None,
            cancel_token: "t".to_string(),
            no_show_reported: false,
            reminder_3h_sent: false,
            reminder_3h_sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_booked_message_mentions_client_and_slot() {
        let event = AppointmentEvent::Booked {
            appointment: sample_appointment(),
            center_name: "Centre A".to_string(),
        };
        assert_eq!(format_event_title(&event), "New booking");
        assert_eq!(
            format_event_message(&event),
            "Jeanne Dupont booked Centre A on 19/11/2025 at 16:20"
        );
    }

    #[test]
    fn test_metadata_carries_appointment_id() {
        let event = AppointmentEvent::StatusChanged {
            appointment: sample_appointment(),
            from: AppointmentStatus::Confirmed,
            to: AppointmentStatus::Completed,
            automatic: true,
        };
        let meta = event_metadata(&event);
        assert_eq!(meta["appointment_id"], 42);
        assert_eq!(meta["to"], "completed");
        assert_eq!(meta["automatic"], true);
    }
}
