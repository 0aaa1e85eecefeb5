use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::appointment;
use crate::services::booking::BookingRequest;
use crate::state::AppState;

pub fn appointments_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_appointment))
        .route("/{id}/cancel", post(cancel_appointment))
        .with_state(state)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BookingResponse {
    pub appointment: appointment::Model,
    /// Needed to cancel without an account; only ever returned here
    pub cancel_token: String,
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "Appointments",
    request_body = BookingRequest,
    responses(
        (status = 201, body = BookingResponse),
        (status = 400, description = "Invalid input or inactive center"),
        (status = 404, description = "Center or slot does not exist"),
        (status = 409, description = "Slot no longer available")
    )
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let created = state.booking.book(request).await?;
    let cancel_token = created.cancel_token.clone();
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            appointment: created,
            cancel_token,
        }),
    ))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CancelRequest {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/cancel",
    tag = "Appointments",
    params(
        ("id" = i64, Path, description = "Appointment ID"),
    ),
    request_body = CancelRequest,
    responses(
        (status = 200, body = appointment::Model),
        (status = 403, description = "Invalid cancellation token"),
        (status = 409, description = "Appointment can no longer be cancelled")
    )
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<appointment::Model>> {
    let cancelled = state.booking.cancel(id, request.token.trim()).await?;
    Ok(Json(cancelled))
}
