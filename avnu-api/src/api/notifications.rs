//! Notification endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use avnu_common::db::models::Notification;

use crate::AppState;

use super::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub user_id: String,
    pub limit: Option<i64>,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let limit = query.limit.unwrap_or(50);
    let notifications = state
        .notifier
        .list(&query.user_id, limit)
        .await
        .map_err(ApiError)?;
    Ok(Json(notifications))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Value>> {
    let count = state
        .notifier
        .unread_count(&query.user_id)
        .await
        .map_err(ApiError)?;
    Ok(Json(json!({ "unread": count })))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    let notification = state.notifier.mark_read(&id).await.map_err(ApiError)?;
    Ok(Json(notification))
}

#[derive(Debug, Deserialize)]
pub struct MarkAllReadBody {
    pub user_id: String,
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Json(body): Json<MarkAllReadBody>,
) -> ApiResult<Json<Value>> {
    let updated = state
        .notifier
        .mark_all_read(&body.user_id)
        .await
        .map_err(ApiError)?;
    Ok(Json(json!({ "updated": updated })))
}
