use crate::config::email::EmailConfig;
use crate::config::scheduling::SchedulingConfig;
use crate::config::security::SecurityConfig;
use crate::services::booking::BookingSettings;
use crate::services::civil_time::{resolve_timezone, CivilTimeError};
use crate::services::email::SharedEmailSender;
use crate::services::reminder::ReminderSettings;
use crate::services::{
    AppointmentStore, BookingService, NotificationService, ReminderDispatcher, SlotService,
    StatusReconciler,
};

pub use super::database::DbConn;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub slots: SlotService,
    pub appointments: AppointmentStore,
    pub booking: BookingService,
    pub reconciler: StatusReconciler,
    pub reminders: ReminderDispatcher,
    pub notification: NotificationService,
    pub security: SecurityConfig,
    pub version: String,
}

impl AppState {
    /// Wire every service around one connection and one email sender.
    /// Fails only when the default timezone cannot be resolved.
    pub fn new(
        db: DbConn,
        email_sender: SharedEmailSender,
        scheduling: &SchedulingConfig,
        email: &EmailConfig,
        security: SecurityConfig,
    ) -> Result<Self, CivilTimeError> {
        let default_zone = resolve_timezone(&scheduling.default_timezone)?;

        let appointments = AppointmentStore::new(db.clone());
        let notification = NotificationService::new(db.clone());

        let booking = BookingService::new(
            db.clone(),
            notification.clone(),
            email_sender.clone(),
            BookingSettings {
                auto_confirm: scheduling.auto_confirm,
                public_url: email.public_url.clone(),
                email_timeout: email.send_timeout,
                default_zone: default_zone.clone(),
            },
        );

        let reconciler = StatusReconciler::new(
            appointments.clone(),
            notification.clone(),
            default_zone.clone(),
            scheduling.status_grace,
        );

        let reminders = ReminderDispatcher::new(
            appointments.clone(),
            email_sender,
            default_zone,
            ReminderSettings {
                lead: scheduling.reminder_lead,
                window: scheduling.reminder_window,
                send_timeout: email.send_timeout,
                public_url: email.public_url.clone(),
            },
        );

        Ok(Self {
            slots: SlotService::new(db.clone()),
            appointments,
            booking,
            reconciler,
            reminders,
            notification,
            security,
            version: env!("CARGO_PKG_VERSION").to_string(),
            db,
        })
    }
}
