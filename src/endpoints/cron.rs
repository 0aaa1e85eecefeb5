//! Sweep triggers for an external scheduler. Guarded by the cron secret.

use axum::{extract::State, routing::get, Json, Router};

use crate::error::Result;
use crate::services::reconciler::SweepSummary;
use crate::services::reminder::ReminderSummary;
use crate::state::AppState;

pub fn cron_routes(state: AppState) -> Router {
    Router::new()
        .route("/reminders", get(run_reminders).post(run_reminders))
        .route("/status-sweep", get(run_status_sweep).post(run_status_sweep))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/cron/reminders",
    tag = "Cron",
    responses(
        (status = 200, body = ReminderSummary),
        (status = 401, description = "Missing or wrong cron secret")
    )
)]
pub async fn run_reminders(State(state): State<AppState>) -> Result<Json<ReminderSummary>> {
    let summary = state.reminders.dispatch().await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/cron/status-sweep",
    tag = "Cron",
    responses(
        (status = 200, body = SweepSummary),
        (status = 401, description = "Missing or wrong cron secret")
    )
)]
pub async fn run_status_sweep(State(state): State<AppState>) -> Result<Json<SweepSummary>> {
    let summary = state.reconciler.sweep().await?;
    Ok(Json(summary))
}
