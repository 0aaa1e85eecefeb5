pub mod admin;
pub mod appointments;
pub mod centers;
pub mod cron;
pub mod notifications;

use axum::{extract::State, middleware as axum_middleware, routing::get, Json, Router};
use utoipa::OpenApi;

use crate::middleware::{require_admin, require_cron_secret, security_headers};
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/system/version", get(get_version))
        .route("/api/openapi.json", get(openapi_json))
        .with_state(state.clone())
        .nest("/api/centers", centers::centers_routes(state.clone()))
        .nest(
            "/api/appointments",
            appointments::appointments_routes(state.clone()),
        );

    // Sweep triggers (cron secret required)
    let cron_routes = Router::new()
        .nest("/api/cron", cron::cron_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_cron_secret,
        ));

    // Admin routes (forwarded admin identity required)
    let admin_routes = Router::new()
        .nest("/api/admin", admin::admin_routes(state.clone()))
        .nest(
            "/api/notifications",
            notifications::notifications_routes(state.clone()),
        )
        .layer(axum_middleware::from_fn_with_state(state, require_admin));

    public_routes
        .merge(cron_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn(security_headers))
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Centerbook API"),
    paths(
        centers::list_centers,
        centers::get_center,
        centers::get_availability,
        appointments::create_appointment,
        appointments::cancel_appointment,
        cron::run_reminders,
        cron::run_status_sweep,
        notifications::list_notifications,
        notifications::get_unread_count,
        notifications::mark_notifications,
        notifications::mark_all_as_read,
        admin::provision_slot,
        admin::update_slot,
        admin::list_appointments,
        admin::get_appointment,
        admin::confirm_appointment,
        admin::report_no_show,
        admin::cancel_appointment,
    ),
    tags(
        (name = "Centers", description = "Public center and availability lookup"),
        (name = "Appointments", description = "Booking and customer cancellation"),
        (name = "Cron", description = "Sweep triggers for an external scheduler"),
        (name = "Notifications", description = "Admin inbox"),
        (name = "Admin", description = "Slot provisioning and appointment management"),
    )
)]
pub struct ApiDoc;

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": state.version,
        "rust_version": "1.83",
        "backend": "rust"
    }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
