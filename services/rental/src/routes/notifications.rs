//! Notification inbox endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::Notification;
use crate::state::AppState;

/// List the caller's notifications, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.notifications.find_by_user(auth.id).await?))
}

/// Unread notification count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let count = state.notifications.count_unread(auth.id).await?;
    Ok(Json(json!({ "unread_count": count })))
}

/// Mark one notification read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.notifications.mark_read(id, auth.id).await? {
        return Err(ApiError::NotFound(format!(
            "Notification {} not found",
            id
        )));
    }
    Ok(Json(json!({ "read": true })))
}

/// Mark all of the caller's notifications read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = state.notifications.mark_all_read(auth.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// Delete one notification
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.notifications.delete_one(id, auth.id).await? {
        return Err(ApiError::NotFound(format!(
            "Notification {} not found",
            id
        )));
    }
    Ok(Json(json!({ "deleted": true })))
}

/// Delete the caller's read notifications
pub async fn delete_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = state.notifications.delete_read(auth.id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Delete all of the caller's notifications
pub async fn delete_all(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = state.notifications.delete_all(auth.id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
