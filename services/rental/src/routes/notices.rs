//! Announcement board endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{require_admin, AuthUser};
use crate::models::{Notice, NoticeInput};
use crate::state::AppState;

/// List all notices, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Notice>>> {
    Ok(Json(state.notices.find_all().await?))
}

fn validate(input: &NoticeInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() || input.content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "title and content are required".to_string(),
        ));
    }
    Ok(())
}

/// Publish a notice
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<NoticeInput>,
) -> ApiResult<(StatusCode, Json<Notice>)> {
    require_admin(&auth)?;
    validate(&req)?;

    let notice = state.notices.insert(&req).await?;
    info!("Notice published: id={}, title={}", notice.id, notice.title);
    Ok((StatusCode::CREATED, Json(notice)))
}

/// Rewrite a notice
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<NoticeInput>,
) -> ApiResult<Json<Notice>> {
    require_admin(&auth)?;
    validate(&req)?;

    let notice = state
        .notices
        .update(id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Notice {} not found", id)))?;
    Ok(Json(notice))
}

/// Take a notice down
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !state.notices.delete(id).await? {
        return Err(ApiError::NotFound(format!("Notice {} not found", id)));
    }
    info!("Notice removed: id={}", id);
    Ok(StatusCode::NO_CONTENT)
}
