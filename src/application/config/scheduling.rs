//! Time rules for the status sweep and the reminder dispatcher.

use std::env;
use std::time::Duration;

use super::{env_bool, env_u64};

#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// IANA zone used for centers without their own `timezone` (env: `CENTERBOOK_TIMEZONE`)
    pub default_timezone: String,
    /// Time after the scheduled moment before a confirmed appointment is settled
    pub status_grace: Duration,
    /// How long before the appointment the reminder is due (3h)
    pub reminder_lead: Duration,
    /// Width of the reminder window ending at `reminder_lead` (15m)
    pub reminder_window: Duration,
    pub status_sweep_interval: Duration,
    pub reminder_interval: Duration,
    /// Run the sweeps in-process; disable when an external cron calls the endpoints
    pub scheduler_enabled: bool,
    /// New bookings start as `confirmed` instead of `pending`
    pub auto_confirm: bool,
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        Self {
            default_timezone: env::var("CENTERBOOK_TIMEZONE")
                .unwrap_or_else(|_| "Europe/Paris".to_string()),
            status_grace: Duration::from_secs(
                env_u64("CENTERBOOK_STATUS_GRACE_MINUTES", 5) * 60,
            ),
            reminder_lead: Duration::from_secs(
                env_u64("CENTERBOOK_REMINDER_LEAD_MINUTES", 180) * 60,
            ),
            reminder_window: Duration::from_secs(
                env_u64("CENTERBOOK_REMINDER_WINDOW_MINUTES", 15) * 60,
            ),
            status_sweep_interval: Duration::from_secs(env_u64(
                "CENTERBOOK_STATUS_SWEEP_INTERVAL_SECS",
                15 * 60,
            )),
            reminder_interval: Duration::from_secs(env_u64(
                "CENTERBOOK_REMINDER_INTERVAL_SECS",
                60 * 60,
            )),
            scheduler_enabled: env_bool("CENTERBOOK_SCHEDULER_ENABLED", true),
            auto_confirm: env_bool("CENTERBOOK_AUTO_CONFIRM", true),
        }
    }
}
