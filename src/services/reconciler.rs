//! Status reconciler: the periodic sweep that moves appointments along as
//! their scheduled moment passes.
//!
//! Each appointment is evaluated and written independently. A failed or stale
//! write is reported in the summary and retried on the next sweep; it never
//! stops the rest of the sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jiff::tz::TimeZone;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::appointment::{self, AppointmentStatus};
use crate::models::center;
use crate::services::appointments::{AppointmentStore, TransitionOutcome};
use crate::services::civil_time::{scheduled_instant, ZoneResolver};
use crate::services::notification::{AppointmentEvent, NotificationService};

/// The transition due for an appointment at `now`, if any.
///
/// - before the scheduled moment: nothing
/// - `pending` once the moment has passed: `cancelled`
/// - `confirmed` once the moment plus `grace` has passed: `completed`, or
///   `no_show` when a no-show was reported
/// - terminal statuses: nothing
pub fn next_status(
    status: AppointmentStatus,
    no_show_reported: bool,
    scheduled: DateTime<Utc>,
    now: DateTime<Utc>,
    grace: Duration,
) -> Option<AppointmentStatus> {
    if now < scheduled {
        return None;
    }

    match status {
        AppointmentStatus::Pending => Some(AppointmentStatus::Cancelled),
        AppointmentStatus::Confirmed => {
            let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::zero());
            if now < scheduled + grace {
                None
            } else if no_show_reported {
                Some(AppointmentStatus::NoShow)
            } else {
                Some(AppointmentStatus::Completed)
            }
        }
        AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow => {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: i64,
    pub client_name: String,
    /// Scheduled moment as an RFC 3339 instant
    pub appointment_time: String,
    pub current_status: AppointmentStatus,
    pub new_status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepIssue {
    pub appointment_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub success: bool,
    pub evaluated: usize,
    pub updates: Vec<StatusUpdate>,
    /// Failed or stale writes; retried next sweep
    pub errors: Vec<SweepIssue>,
    /// Rows excluded from processing because their data is inconsistent
    pub anomalies: Vec<SweepIssue>,
}

#[derive(Clone)]
pub struct StatusReconciler {
    store: AppointmentStore,
    notification: NotificationService,
    default_zone: TimeZone,
    grace: Duration,
}

impl StatusReconciler {
    pub fn new(
        store: AppointmentStore,
        notification: NotificationService,
        default_zone: TimeZone,
        grace: Duration,
    ) -> Self {
        Self {
            store,
            notification,
            default_zone,
            grace,
        }
    }

    pub async fn sweep(&self) -> Result<SweepSummary> {
        self.sweep_at(Utc::now()).await
    }

    /// Run one sweep as if the current instant were `now`
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepSummary> {
        // Centers east of UTC can be a civil day ahead
        let up_to = (now + chrono::Duration::days(1)).date_naive();
        let candidates = self.store.due_for_status_sweep(up_to).await?;
        Ok(self.reconcile(candidates, now).await)
    }

    /// Evaluate and write each loaded candidate. Rows whose status changed
    /// since they were loaded end up in `errors` and are picked up again by
    /// the next sweep.
    pub async fn reconcile(
        &self,
        candidates: Vec<(appointment::Model, Option<center::Model>)>,
        now: DateTime<Utc>,
    ) -> SweepSummary {
        let mut zones = ZoneResolver::new(self.default_zone.clone());
        let mut summary = SweepSummary {
            evaluated: candidates.len(),
            ..Default::default()
        };

        for (appt, center) in candidates {
            let (status, scheduled) = match self.evaluate(&appt, center.as_ref(), &mut zones) {
                Ok(v) => v,
                Err(message) => {
                    tracing::warn!(appointment_id = appt.id, %message, "Sweep anomaly");
                    summary.anomalies.push(SweepIssue {
                        appointment_id: appt.id,
                        message,
                    });
                    continue;
                }
            };

            let Some(next) = next_status(status, appt.no_show_reported, scheduled, now, self.grace)
            else {
                continue;
            };

            match self.store.transition(appt.id, status, next, now).await {
                Ok(TransitionOutcome::Applied(updated)) => {
                    summary.updates.push(StatusUpdate {
                        id: updated.id,
                        client_name: updated.client_name(),
                        appointment_time: scheduled.to_rfc3339(),
                        current_status: status,
                        new_status: next,
                    });
                    self.notification
                        .notify_or_log(&AppointmentEvent::StatusChanged {
                            appointment: updated,
                            from: status,
                            to: next,
                            automatic: true,
                        })
                        .await;
                }
                Ok(TransitionOutcome::Stale) => {
                    tracing::warn!(
                        appointment_id = appt.id,
                        from = %status,
                        to = %next,
                        "Status changed concurrently, skipping"
                    );
                    summary.errors.push(SweepIssue {
                        appointment_id: appt.id,
                        message: format!("stale write: status is no longer {}", status),
                    });
                }
                Err(e) => {
                    tracing::warn!(appointment_id = appt.id, error = %e, "Status transition failed");
                    summary.errors.push(SweepIssue {
                        appointment_id: appt.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        summary.success = summary.errors.is_empty();

        tracing::info!(
            evaluated = summary.evaluated,
            updated = summary.updates.len(),
            errors = summary.errors.len(),
            anomalies = summary.anomalies.len(),
            "Status sweep finished"
        );

        summary
    }

    /// Parsed status and scheduled instant, or why the row cannot be processed
    fn evaluate(
        &self,
        appt: &appointment::Model,
        center: Option<&center::Model>,
        zones: &mut ZoneResolver,
    ) -> std::result::Result<(AppointmentStatus, DateTime<Utc>), String> {
        let status = appt
            .status()
            .ok_or_else(|| format!("unknown status '{}'", appt.status))?;
        let center = match (appt.center_id, center) {
            (None, _) => return Err("appointment has no center".to_string()),
            (Some(id), None) => return Err(format!("center {} does not exist", id)),
            (Some(_), Some(center)) => center,
        };
        let tz = zones.for_center(center).map_err(|e| e.to_string())?;
        let scheduled = scheduled_instant(appt.appointment_date, appt.appointment_time, &tz)
            .map_err(|e| e.to_string())?;
        Ok((status, scheduled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    const GRACE: Duration = Duration::from_secs(5 * 60);

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 19, h, m, 0).unwrap()
    }

    #[test]
    fn test_nothing_before_scheduled_moment() {
        for status in [AppointmentStatus::Pending, AppointmentStatus::Confirmed] {
            assert_eq!(next_status(status, false, at(16, 20), at(16, 19), GRACE), None);
        }
    }

    #[test]
    fn test_confirmed_completes_after_grace() {
        assert_eq!(
            next_status(AppointmentStatus::Confirmed, false, at(16, 20), at(16, 24), GRACE),
            None
        );
        assert_eq!(
            next_status(AppointmentStatus::Confirmed, false, at(16, 20), at(16, 25), GRACE),
            Some(AppointmentStatus::Completed)
        );
    }

    #[test]
    fn test_reported_no_show_wins_over_completion() {
        assert_eq!(
            next_status(AppointmentStatus::Confirmed, true, at(16, 20), at(17, 0), GRACE),
            Some(AppointmentStatus::NoShow)
        );
    }

    #[test]
    fn test_pending_expires_at_scheduled_moment() {
        assert_eq!(
            next_status(AppointmentStatus::Pending, false, at(16, 20), at(16, 20), GRACE),
            Some(AppointmentStatus::Cancelled)
        );
    }

    #[test]
    fn test_terminal_statuses_never_move() {
        for status in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert_eq!(next_status(status, true, at(8, 0), at(23, 0), GRACE), None);
        }
    }
}
