use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::CurrentAdmin;
use crate::models::{appointment, slot};
use crate::services::appointments::AppointmentQuery;
use crate::services::slots::NewSlot;
use crate::state::AppState;

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        // Slots
        .route("/centers/{id}/slots", post(provision_slot))
        .route("/slots/{id}", patch(update_slot))
        // Appointments
        .route("/appointments", get(list_appointments))
        .route("/appointments/{id}", get(get_appointment))
        .route("/appointments/{id}/confirm", post(confirm_appointment))
        .route("/appointments/{id}/no-show", post(report_no_show))
        .route("/appointments/{id}/cancel", post(cancel_appointment))
        .with_state(state)
}

// ============================================================================
// Slots
// ============================================================================

#[utoipa::path(
    post,
    path = "/api/admin/centers/{id}/slots",
    tag = "Admin",
    params(
        ("id" = i64, Path, description = "Center ID"),
    ),
    request_body = NewSlot,
    responses(
        (status = 201, body = slot::Model),
        (status = 404, description = "Center not found"),
        (status = 409, description = "A slot already exists at that time")
    )
)]
pub async fn provision_slot(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(center_id): Path<i64>,
    Json(new_slot): Json<NewSlot>,
) -> Result<(StatusCode, Json<slot::Model>)> {
    let created = state.slots.provision(center_id, new_slot).await?;
    tracing::info!(admin_id = admin.id(), slot_id = created.id, "Slot created by admin");
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateSlotRequest {
    pub is_available: bool,
}

#[utoipa::path(
    patch,
    path = "/api/admin/slots/{id}",
    tag = "Admin",
    params(
        ("id" = i64, Path, description = "Slot ID"),
    ),
    request_body = UpdateSlotRequest,
    responses(
        (status = 200, body = slot::Model),
        (status = 404, description = "Slot not found")
    )
)]
pub async fn update_slot(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(slot_id): Path<i64>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<slot::Model>> {
    let updated = state
        .slots
        .set_availability(slot_id, request.is_available)
        .await?;
    tracing::debug!(admin_id = admin.id(), slot_id, "Slot updated by admin");
    Ok(Json(updated))
}

// ============================================================================
// Appointments
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    tag = "Admin",
    params(AppointmentQuery),
    responses(
        (status = 200, body = Vec<appointment::Model>)
    )
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<appointment::Model>>> {
    let appointments = state.appointments.list(&query).await?;
    Ok(Json(appointments))
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments/{id}",
    tag = "Admin",
    params(
        ("id" = i64, Path, description = "Appointment ID"),
    ),
    responses(
        (status = 200, body = appointment::Model),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<appointment::Model>> {
    Ok(Json(state.appointments.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/appointments/{id}/confirm",
    tag = "Admin",
    params(
        ("id" = i64, Path, description = "Appointment ID"),
    ),
    responses(
        (status = 200, body = appointment::Model),
        (status = 409, description = "Appointment is not pending")
    )
)]
pub async fn confirm_appointment(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<appointment::Model>> {
    let updated = state.booking.confirm(id).await?;
    tracing::info!(admin_id = admin.id(), appointment_id = id, "Appointment confirmed by admin");
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/api/admin/appointments/{id}/no-show",
    tag = "Admin",
    params(
        ("id" = i64, Path, description = "Appointment ID"),
    ),
    responses(
        (status = 200, body = appointment::Model),
        (status = 409, description = "Appointment is not confirmed")
    )
)]
pub async fn report_no_show(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<appointment::Model>> {
    let updated = state.booking.report_no_show(id).await?;
    tracing::info!(admin_id = admin.id(), appointment_id = id, "No-show reported by admin");
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/api/admin/appointments/{id}/cancel",
    tag = "Admin",
    params(
        ("id" = i64, Path, description = "Appointment ID"),
    ),
    responses(
        (status = 200, body = appointment::Model),
        (status = 409, description = "Appointment is already terminal")
    )
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<appointment::Model>> {
    let updated = state.booking.admin_cancel(id).await?;
    tracing::info!(admin_id = admin.id(), appointment_id = id, "Appointment cancelled by admin");
    Ok(Json(updated))
}
