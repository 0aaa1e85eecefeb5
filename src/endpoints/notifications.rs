use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::CurrentAdmin;
use crate::models::notification;
use crate::services::notification::NotificationFilter;
use crate::state::AppState;

pub fn notifications_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_notifications).patch(mark_notifications))
        .route("/count", get(get_unread_count))
        .route("/read-all", post(mark_all_as_read))
        .with_state(state)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationDto {
    pub id: i64,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

impl From<notification::Model> for NotificationDto {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            link: n.link,
            is_read: n.is_read,
            read_at: n.read_at.map(|t| t.to_rfc3339()),
            created_at: n.created_at.to_rfc3339(),
            metadata: n
                .metadata
                .as_deref()
                .and_then(|m| serde_json::from_str(m).ok()),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationDto>,
    pub total: u64,
    pub unread: u64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub is_read: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(
        ("limit" = Option<u64>, Query, description = "Number of notifications to return"),
        ("offset" = Option<u64>, Query, description = "Offset for pagination"),
        ("is_read" = Option<bool>, Query, description = "Only read (true) or unread (false)"),
    ),
    responses(
        (status = 200, body = NotificationListResponse)
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<NotificationListResponse>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.offset.unwrap_or(0);
    let filter = NotificationFilter::from_is_read(query.is_read);

    let notifications = state
        .notification
        .list(admin.id(), filter, limit, offset)
        .await?;
    let total = state.notification.total_count(admin.id()).await?;
    let unread = state.notification.unread_count(admin.id()).await?;

    Ok(Json(NotificationListResponse {
        notifications: notifications.into_iter().map(NotificationDto::from).collect(),
        total,
        unread,
    }))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[utoipa::path(
    get,
    path = "/api/notifications/count",
    tag = "Notifications",
    responses(
        (status = 200, body = UnreadCountResponse)
    )
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    admin: CurrentAdmin,
) -> Result<Json<UnreadCountResponse>> {
    let count = state.notification.unread_count(admin.id()).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub ids: Vec<i64>,
    pub mark_as_read: bool,
}

#[utoipa::path(
    patch,
    path = "/api/notifications",
    tag = "Notifications",
    request_body = MarkReadRequest,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 400, description = "Only markAsRead: true is supported")
    )
)]
pub async fn mark_notifications(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>> {
    if !request.mark_as_read {
        return Err(AppError::BadRequest(
            "Notifications cannot be marked unread".to_string(),
        ));
    }
    let updated = state.notification.mark_read(admin.id(), &request.ids).await?;
    Ok(Json(serde_json::json!({ "success": true, "updated": updated })))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, body = serde_json::Value)
    )
)]
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    admin: CurrentAdmin,
) -> Result<Json<serde_json::Value>> {
    let updated = state.notification.mark_all_read(admin.id()).await?;
    Ok(Json(serde_json::json!({ "success": true, "updated": updated })))
}
