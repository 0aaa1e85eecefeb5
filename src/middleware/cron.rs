//! Bearer-secret guard for the sweep endpoints called by an external scheduler.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use super::auth::unauthorized_response;
use crate::state::AppState;

pub async fn require_cron_secret(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.security.cron_secret.as_deref() else {
        tracing::warn!("Cron endpoint called but no cron secret is configured");
        return unauthorized_response("Unauthorized");
    };

    match extract_bearer_token(&req) {
        Some(token) if secret_matches(token, expected) => next.run(req).await,
        _ => {
            tracing::warn!(path = %req.uri().path(), "Rejected cron call with a bad secret");
            unauthorized_response("Unauthorized")
        }
    }
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches_only_exact_value() {
        assert!(secret_matches("s3cret-value", "s3cret-value"));
        assert!(!secret_matches("s3cret-valuf", "s3cret-value"));
        assert!(!secret_matches("s3cret", "s3cret-value"));
        assert!(!secret_matches("", "s3cret-value"));
    }
}
