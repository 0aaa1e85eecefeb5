//! Appointment store: reads and guarded writes on `appointments`.
//!
//! Every status write is conditional on the status the caller last saw, so a
//! sweep racing a cancellation loses cleanly instead of overwriting it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::appointment::{self, AppointmentStatus};
use crate::models::center;
use crate::models::prelude::*;
use crate::state::DbConn;

/// Outcome of a guarded status write
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Applied(appointment::Model),
    /// The row no longer had the expected status (or no longer exists)
    Stale,
}

/// Admin listing filter
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentQuery {
    pub center_id: Option<i64>,
    #[param(value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>)]
    pub to: Option<NaiveDate>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// The appointment currently holding (center, date, time), if any.
/// Generic over the connection so the booking transaction can use it.
pub async fn find_occupying<C: ConnectionTrait>(
    conn: &C,
    center_id: i64,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Option<appointment::Model>> {
    let found = Appointment::find()
        .filter(appointment::Column::CenterId.eq(center_id))
        .filter(appointment::Column::AppointmentDate.eq(date))
        .filter(appointment::Column::AppointmentTime.eq(time))
        .filter(appointment::Column::Status.is_not_in(AppointmentStatus::slot_releasing()))
        .one(conn)
        .await?;
    Ok(found)
}

#[derive(Clone)]
pub struct AppointmentStore {
    db: DbConn,
}

impl AppointmentStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i64) -> Result<Option<appointment::Model>> {
        Ok(Appointment::find_by_id(id).one(&self.db).await?)
    }

    pub async fn get(&self, id: i64) -> Result<appointment::Model> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))
    }

    pub async fn list(&self, query: &AppointmentQuery) -> Result<Vec<appointment::Model>> {
        let mut select = Appointment::find();

        if let Some(center_id) = query.center_id {
            select = select.filter(appointment::Column::CenterId.eq(center_id));
        }
        if let Some(from) = query.from {
            select = select.filter(appointment::Column::AppointmentDate.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(appointment::Column::AppointmentDate.lte(to));
        }
        if let Some(status) = query.status.as_deref() {
            let status = AppointmentStatus::parse(status)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}", status)))?;
            select = select.filter(appointment::Column::Status.eq(status.as_str()));
        }

        let appointments = select
            .order_by_asc(appointment::Column::AppointmentDate)
            .order_by_asc(appointment::Column::AppointmentTime)
            .offset(query.offset.unwrap_or(0))
            .limit(query.limit.unwrap_or(50).min(500))
            .all(&self.db)
            .await?;

        Ok(appointments)
    }

    /// Non-terminal appointments dated on or before `up_to`, with their center.
    /// Coarse date filter; the precise per-row time check happens in the sweep.
    pub async fn due_for_status_sweep(
        &self,
        up_to: NaiveDate,
    ) -> Result<Vec<(appointment::Model, Option<center::Model>)>> {
        let active: Vec<&str> = AppointmentStatus::active()
            .iter()
            .map(|s| s.as_str())
            .collect();

        let rows = Appointment::find()
            .filter(appointment::Column::Status.is_in(active))
            .filter(appointment::Column::AppointmentDate.lte(up_to))
            .find_also_related(Center)
            .order_by_asc(appointment::Column::AppointmentDate)
            .order_by_asc(appointment::Column::AppointmentTime)
            .all(&self.db)
            .await?;

        Ok(rows)
    }

    /// Confirmed appointments without a reminder, dated within `[from, to]`
    pub async fn reminder_candidates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(appointment::Model, Option<center::Model>)>> {
        let rows = Appointment::find()
            .filter(appointment::Column::Status.eq(AppointmentStatus::Confirmed.as_str()))
            .filter(appointment::Column::Reminder3hSent.eq(false))
            .filter(appointment::Column::AppointmentDate.between(from, to))
            .find_also_related(Center)
            .order_by_asc(appointment::Column::AppointmentDate)
            .order_by_asc(appointment::Column::AppointmentTime)
            .all(&self.db)
            .await?;

        Ok(rows)
    }

    /// `UPDATE ... SET status = to WHERE id = ? AND status = from`
    pub async fn transition(
        &self,
        id: i64,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        if !from.can_transition_to(to) {
            return Err(AppError::Conflict(format!(
                "Cannot move appointment from {} to {}",
                from, to
            )));
        }

        let result = Appointment::update_many()
            .col_expr(appointment::Column::Status, Expr::value(to.as_str()))
            .col_expr(appointment::Column::UpdatedAt, Expr::value(now))
            .filter(appointment::Column::Id.eq(id))
            .filter(appointment::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(TransitionOutcome::Stale);
        }

        match self.find(id).await? {
            Some(updated) => Ok(TransitionOutcome::Applied(updated)),
            None => Ok(TransitionOutcome::Stale),
        }
    }

    /// Record the explicit no-show signal the sweep acts on
    pub async fn flag_no_show(&self, id: i64, now: DateTime<Utc>) -> Result<bool> {
        let result = Appointment::update_many()
            .col_expr(appointment::Column::NoShowReported, Expr::value(true))
            .col_expr(appointment::Column::UpdatedAt, Expr::value(now))
            .filter(appointment::Column::Id.eq(id))
            .filter(appointment::Column::Status.eq(AppointmentStatus::Confirmed.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Claim the reminder for one appointment.
    ///
    /// Only one caller can flip the flag from false to true, so only one
    /// caller ever proceeds to send.
    pub async fn claim_reminder(&self, id: i64, now: DateTime<Utc>) -> Result<bool> {
        let result = Appointment::update_many()
            .col_expr(appointment::Column::Reminder3hSent, Expr::value(true))
            .col_expr(appointment::Column::Reminder3hSentAt, Expr::value(now))
            .filter(appointment::Column::Id.eq(id))
            .filter(appointment::Column::Reminder3hSent.eq(false))
            .filter(appointment::Column::Status.eq(AppointmentStatus::Confirmed.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Give a claim back after a failed send so the next run retries it
    pub async fn release_reminder(&self, id: i64) -> Result<()> {
        Appointment::update_many()
            .col_expr(appointment::Column::Reminder3hSent, Expr::value(false))
            .col_expr(
                appointment::Column::Reminder3hSentAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(appointment::Column::Id.eq(id))
            .filter(appointment::Column::Reminder3hSent.eq(true))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
