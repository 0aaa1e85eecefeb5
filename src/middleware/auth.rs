//! Admin identity middleware for `/api/admin/*` and `/api/notifications/*`
//!
//! Login is handled upstream; the admin-auth layer in front of this service
//! forwards the authenticated admin id in `X-Admin-Id`. The id must name an
//! existing, active admin.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::error::AppError;
use crate::models::admin;
use crate::models::prelude::*;
use crate::state::AppState;

pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// Authenticated admin stored in request extensions
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub admin::Model);

impl CurrentAdmin {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Resolve the forwarded admin id, or answer 401
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let admin_id = match extract_admin_id(&req) {
        Some(id) => id,
        None => return unauthorized_response("Missing or invalid X-Admin-Id header"),
    };

    let found = Admin::find_by_id(admin_id)
        .filter(admin::Column::IsActive.eq(true))
        .one(&state.db)
        .await;

    let current = match found {
        Ok(Some(admin)) => admin,
        Ok(None) => return unauthorized_response("Admin not found or inactive"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load admin");
            return unauthorized_response("Unable to verify admin");
        }
    };

    req.extensions_mut().insert(CurrentAdmin(current));
    next.run(req).await
}

fn extract_admin_id(req: &Request) -> Option<i64> {
    req.headers()
        .get(ADMIN_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Create a 401 Unauthorized JSON response
pub(crate) fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "detail": message
        })),
    )
        .into_response()
}
