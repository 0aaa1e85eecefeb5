//! Application bootstrapper
//!
//! Handles all initialization and setup for the Centerbook backend.

use std::net::SocketAddr;

use axum::{http::HeaderValue, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::services::{email, scheduler};
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Centerbook backend v{}", CONFIG.version);

    let state = init_services().await?;

    if CONFIG.scheduling.scheduler_enabled {
        scheduler::start_scheduler(
            state.reconciler.clone(),
            state.reminders.clone(),
            CONFIG.scheduling.status_sweep_interval,
            CONFIG.scheduling.reminder_interval,
        );
    } else {
        tracing::info!("In-process scheduler disabled - sweeps run only via /api/cron");
    }

    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("centerbook={}", CONFIG.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if CONFIG.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init();
    }
}

/// Initialize all application services
async fn init_services() -> anyhow::Result<AppState> {
    let conn = db::connect(&CONFIG.database).await?;
    tracing::info!("Database connection established");

    let sender = email::sender_from_config(&CONFIG.email);

    let state = AppState::new(
        conn,
        sender,
        &CONFIG.scheduling,
        &CONFIG.email,
        CONFIG.security.clone(),
    )?;

    if CONFIG.security.cron_secret.is_none() {
        tracing::warn!("CENTERBOOK_CRON_SECRET not set - cron endpoints will reject every call");
    }

    Ok(state)
}

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&CONFIG.server.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let host: std::net::IpAddr = CONFIG.server.host.parse()?;
    let addr = SocketAddr::from((host, CONFIG.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
