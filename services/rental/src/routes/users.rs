//! User profile and administration endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{require_admin, AuthUser};
use crate::models::{UpdateProfile, User};
use crate::state::AppState;
use crate::validation::{validate_display_name, validate_phone_number};

/// Current user's profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// Update the current user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(update): Json<UpdateProfile>,
) -> ApiResult<Json<User>> {
    if let Some(name) = &update.display_name {
        validate_display_name(name).map_err(ApiError::BadRequest)?;
    }
    if let Some(phone) = &update.phone_number {
        validate_phone_number(phone).map_err(ApiError::BadRequest)?;
    }

    let user = state
        .users
        .update_profile(auth.id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// List all users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&auth)?;
    Ok(Json(state.users.find_all().await?))
}

/// Fetch one user (admin only)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    require_admin(&auth)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Change a user's role (admin only)
pub async fn update_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
    require_admin(&auth)?;

    if req.role != "user" && req.role != "admin" {
        return Err(ApiError::BadRequest(format!(
            "Unknown role: {}",
            req.role
        )));
    }

    let user = state
        .users
        .update_role(id, &req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("Role changed: user_id={}, role={}", id, req.role);
    Ok(Json(user))
}

/// Delete a user (admin only). Admins cannot delete themselves.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;

    if id == auth.id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("User deleted: user_id={}", id);
    Ok(Json(json!({ "deleted": true })))
}
