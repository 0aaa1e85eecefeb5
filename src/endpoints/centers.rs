use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::center;
use crate::models::prelude::*;
use crate::services::slots::SlotAvailability;
use crate::state::AppState;

pub fn centers_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_centers))
        .route("/{id}", get(get_center))
        .route("/{id}/availability", get(get_availability))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/centers",
    tag = "Centers",
    responses(
        (status = 200, body = Vec<center::Model>)
    )
)]
pub async fn list_centers(State(state): State<AppState>) -> Result<Json<Vec<center::Model>>> {
    let centers = Center::find()
        .filter(center::Column::IsActive.eq(true))
        .order_by_asc(center::Column::City)
        .order_by_asc(center::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(centers))
}

#[utoipa::path(
    get,
    path = "/api/centers/{id}",
    tag = "Centers",
    params(
        ("id" = i64, Path, description = "Center ID"),
    ),
    responses(
        (status = 200, body = center::Model),
        (status = 404, description = "Center not found")
    )
)]
pub async fn get_center(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<center::Model>> {
    let found = Center::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Center {} not found", id)))?;
    Ok(Json(found))
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AvailabilityResponse {
    pub center_id: i64,
    #[schema(value_type = String)]
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
}

#[utoipa::path(
    get,
    path = "/api/centers/{id}/availability",
    tag = "Centers",
    params(
        ("id" = i64, Path, description = "Center ID"),
        ("date" = String, Query, description = "Civil date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, body = AvailabilityResponse),
        (status = 404, description = "Center not found")
    )
)]
pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let slots = state.slots.availability(id, query.date).await?;
    Ok(Json(AvailabilityResponse {
        center_id: id,
        date: query.date,
        slots,
    }))
}
