//! Saved card endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{NewPaymentMethod, PaymentMethod};
use crate::state::AppState;

/// List the caller's saved cards, default card first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<PaymentMethod>>> {
    Ok(Json(state.payment_methods.find_by_user(auth.id).await?))
}

/// Save a new card to the caller's wallet
pub async fn add(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<NewPaymentMethod>,
) -> ApiResult<(StatusCode, Json<PaymentMethod>)> {
    if req.card_number.trim().is_empty()
        || req.card_company.trim().is_empty()
        || req.card_expiry.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "card_number, card_company and card_expiry are required".to_string(),
        ));
    }

    let card = state.payment_methods.insert(auth.id, &req).await?;
    info!("Card saved: user={}, id={}", auth.id, card.id);
    Ok((StatusCode::CREATED, Json(card)))
}

/// Remove one of the caller's saved cards
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.payment_methods.delete(id, auth.id).await? {
        return Err(ApiError::NotFound(format!(
            "Payment method {} not found",
            id
        )));
    }
    Ok(Json(json!({ "deleted": true })))
}
