//! Cron endpoint integration tests
//!
//! Covers:
//! - Bearer secret enforcement on /api/cron/*
//! - Response shape of both sweeps, via GET and POST

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};

mod common;
use common::*;

use centerbook::config::security::SecurityConfig;
use centerbook::endpoints::create_router;

fn cron_request(method: &str, uri: &str, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(secret) = secret {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", secret));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_missing_or_wrong_secret_is_rejected() {
    let (app, _, _) = build_app(create_test_db().await);

    for uri in ["/api/cron/reminders", "/api/cron/status-sweep"] {
        let missing = send(&app, cron_request("GET", uri, None)).await;
        assert_status(&missing, StatusCode::UNAUTHORIZED);

        let wrong = send(&app, cron_request("POST", uri, Some("guess"))).await;
        assert_status(&wrong, StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong).await["detail"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_unconfigured_secret_rejects_everything() {
    let (state, _) = build_state_with(
        create_test_db().await,
        scheduling_config(),
        SecurityConfig { cron_secret: None },
    );
    let app = create_router(state);

    let response = send(&app, cron_request("GET", "/api/cron/reminders", Some(""))).await;
    assert_status(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reminders_summary_shape() {
    let (app, _, _) = build_app(create_test_db().await);

    for method in ["GET", "POST"] {
        let response = send(&app, cron_request(method, "/api/cron/reminders", Some(CRON_SECRET))).await;
        assert_status(&response, StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalAppointments"], 0);
        assert_eq!(body["successCount"], 0);
        assert_eq!(body["errorCount"], 0);
        assert!(body["results"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_status_sweep_updates_past_appointments() {
    let db = create_test_db().await;
    let center = seed_center(&db, "Centre A").await;
    // Long past: completes on any real clock
    seed_appointment(&db, Some(center.id), date(2024, 1, 10), time(10, 0), "confirmed").await;
    let (app, _, _) = build_app(db);

    let response = send(&app, cron_request("POST", "/api/cron/status-sweep", Some(CRON_SECRET))).await;
    assert_status(&response, StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["updates"].as_array().unwrap().len(), 1);
    assert_eq!(body["updates"][0]["newStatus"], "completed");
    assert!(body["errors"].as_array().unwrap().is_empty());
}
