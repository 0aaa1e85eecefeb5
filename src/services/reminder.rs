//! Reminder dispatcher.
//!
//! Sends one reminder per confirmed appointment whose scheduled moment falls
//! inside `[now + lead - window, now + lead]`. The `reminder_3h_sent` flag is
//! claimed with a conditional update before sending, so overlapping runs can
//! never both send. A failed or timed-out send releases the claim and the
//! appointment is retried on the next run.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use jiff::tz::TimeZone;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::{appointment, center};
use crate::services::appointments::AppointmentStore;
use crate::services::civil_time::{scheduled_instant, ZoneResolver};
use crate::services::email::{appointment_variables, EmailTemplate, SharedEmailSender};

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub lead: Duration,
    pub window: Duration,
    pub send_timeout: Duration,
    pub public_url: String,
}

/// Whether `scheduled` lies in `[now + lead - window, now + lead]`
pub fn in_window(
    scheduled: DateTime<Utc>,
    now: DateTime<Utc>,
    lead: Duration,
    window: Duration,
) -> bool {
    let (Ok(lead), Ok(window)) = (
        chrono::Duration::from_std(lead),
        chrono::Duration::from_std(window),
    ) else {
        return false;
    };
    let end = now + lead;
    let start = end - window;
    scheduled >= start && scheduled <= end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReminderOutcome {
    Sent,
    Error,
    /// Claimed by a concurrent run, or left the window before sending
    Skipped,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResult {
    pub appointment_id: i64,
    pub status: ReminderOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSummary {
    pub success: bool,
    /// Candidates whose scheduled moment is inside the window
    pub total_appointments: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub results: Vec<ReminderResult>,
    /// Rows excluded because their center or civil time could not be resolved
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<i64>,
}

#[derive(Clone)]
pub struct ReminderDispatcher {
    store: AppointmentStore,
    email: SharedEmailSender,
    default_zone: TimeZone,
    settings: ReminderSettings,
}

impl ReminderDispatcher {
    pub fn new(
        store: AppointmentStore,
        email: SharedEmailSender,
        default_zone: TimeZone,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            store,
            email,
            default_zone,
            settings,
        }
    }

    pub async fn dispatch(&self) -> Result<ReminderSummary> {
        self.dispatch_at(Utc::now()).await
    }

    pub async fn dispatch_at(&self, now: DateTime<Utc>) -> Result<ReminderSummary> {
        let lead =
            chrono::Duration::from_std(self.settings.lead).unwrap_or(chrono::Duration::zero());

        // Coarse date range; wide enough for any center offset. The precise
        // check is per row below.
        let target = now + lead;
        let from = (target - chrono::Duration::days(1)).date_naive();
        let to = (target + chrono::Duration::days(1)).date_naive();
        let candidates = self.store.reminder_candidates(from, to).await?;

        let started = Instant::now();
        let mut zones = ZoneResolver::new(self.default_zone.clone());
        let mut summary = ReminderSummary::default();

        for (appt, center) in candidates {
            let Some(center) = center else {
                tracing::warn!(appointment_id = appt.id, "Reminder candidate without a center");
                summary.anomalies.push(appt.id);
                continue;
            };
            let scheduled = match zones
                .for_center(&center)
                .and_then(|tz| scheduled_instant(appt.appointment_date, appt.appointment_time, &tz))
            {
                Ok(instant) => instant,
                Err(e) => {
                    tracing::warn!(appointment_id = appt.id, error = %e, "Reminder candidate skipped");
                    summary.anomalies.push(appt.id);
                    continue;
                }
            };

            if !in_window(scheduled, now, self.settings.lead, self.settings.window) {
                continue;
            }

            summary.total_appointments += 1;
            let elapsed = chrono::Duration::from_std(started.elapsed())
                .unwrap_or(chrono::Duration::zero());
            let result = self.remind(&appt, &center, scheduled, now + elapsed).await;
            match result.status {
                ReminderOutcome::Sent => summary.success_count += 1,
                ReminderOutcome::Error => summary.error_count += 1,
                ReminderOutcome::Skipped => {}
            }
            summary.results.push(result);
        }

        summary.success = summary.error_count == 0;

        tracing::info!(
            candidates = summary.total_appointments,
            sent = summary.success_count,
            errors = summary.error_count,
            "Reminder dispatch finished"
        );

        Ok(summary)
    }

    async fn remind(
        &self,
        appt: &appointment::Model,
        center: &center::Model,
        scheduled: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ReminderResult {
        let result = |status, error: Option<String>| ReminderResult {
            appointment_id: appt.id,
            status,
            error,
        };

        // `now` includes the time spent on earlier rows of this run
        if !in_window(scheduled, now, self.settings.lead, self.settings.window) {
            return result(ReminderOutcome::Skipped, None);
        }

        match self.store.claim_reminder(appt.id, now).await {
            Ok(true) => {}
            Ok(false) => return result(ReminderOutcome::Skipped, None),
            Err(e) => {
                tracing::warn!(appointment_id = appt.id, error = %e, "Reminder claim failed");
                return result(ReminderOutcome::Error, Some(e.to_string()));
            }
        }

        let variables = appointment_variables(appt, Some(center), &self.settings.public_url);
        let send = self
            .email
            .send(EmailTemplate::Reminder3h, &appt.email, &variables);

        let failure = match tokio::time::timeout(self.settings.send_timeout, send).await {
            Ok(sent) if sent.success => None,
            Ok(sent) => Some(sent.error.unwrap_or_else(|| "send failed".to_string())),
            Err(_) => Some(format!("send timed out after {:?}", self.settings.send_timeout)),
        };

        match failure {
            None => {
                tracing::info!(appointment_id = appt.id, "Reminder sent");
                result(ReminderOutcome::Sent, None)
            }
            Some(error) => {
                tracing::warn!(appointment_id = appt.id, %error, "Reminder send failed");
                if let Err(e) = self.store.release_reminder(appt.id).await {
                    tracing::error!(
                        appointment_id = appt.id,
                        error = %e,
                        "Failed to release reminder claim"
                    );
                }
                result(ReminderOutcome::Error, Some(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    const LEAD: Duration = Duration::from_secs(3 * 60 * 60);
    const WINDOW: Duration = Duration::from_secs(15 * 60);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 19, 13, 0, 0).unwrap()
    }

    fn ahead(minutes: i64) -> DateTime<Utc> {
        now() + chrono::Duration::minutes(minutes)
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        assert!(in_window(ahead(165), now(), LEAD, WINDOW));
        assert!(in_window(ahead(170), now(), LEAD, WINDOW));
        assert!(in_window(ahead(180), now(), LEAD, WINDOW));
    }

    #[test]
    fn test_outside_window() {
        assert!(!in_window(ahead(164), now(), LEAD, WINDOW));
        assert!(!in_window(ahead(181), now(), LEAD, WINDOW));
        assert!(!in_window(ahead(-10), now(), LEAD, WINDOW));
    }

    #[test]
    fn test_second_run_ten_minutes_later_is_outside() {
        let scheduled = ahead(170);
        let later = now() + chrono::Duration::minutes(10);
        assert!(!in_window(scheduled, later, LEAD, WINDOW));
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = ReminderSummary {
            success: true,
            total_appointments: 1,
            success_count: 1,
            error_count: 0,
            results: vec![ReminderResult {
                appointment_id: 3,
                status: ReminderOutcome::Sent,
                error: None,
            }],
            anomalies: vec![],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalAppointments"], 1);
        assert_eq!(json["successCount"], 1);
        assert_eq!(json["results"][0]["status"], "sent");
        assert!(json.get("anomalies").is_none());
    }
}
