//! Admin endpoints: reservation management, license review, and statistics

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::middleware::{require_admin, AuthUser};
use crate::models::{Reservation, ReservationStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    pub status: Option<String>,
}

fn default_page_size() -> u32 {
    20
}

/// List reservations with paging, optionally filtered by status
pub async fn list_reservations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<Reservation>>> {
    require_admin(&auth)?;

    let reservations = match query.status {
        Some(raw) => {
            let status = raw
                .parse::<ReservationStatus>()
                .map_err(ApiError::BadRequest)?;
            state
                .reservations
                .find_by_status(status, query.page, query.size)
                .await?
        }
        None => state.reservations.find_all(query.page, query.size).await?,
    };
    Ok(Json(reservations))
}

/// Fetch any reservation
pub async fn get_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Reservation>> {
    require_admin(&auth)?;
    let reservation = state
        .reservations
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {} not found", id)))?;
    Ok(Json(reservation))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Move a reservation to a new status, enforcing the lifecycle table
pub async fn update_reservation_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Reservation>> {
    require_admin(&auth)?;

    let target = req
        .status
        .parse::<ReservationStatus>()
        .map_err(ApiError::BadRequest)?;

    let reservation = state
        .reservations
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {} not found", id)))?;

    if !reservation.status.can_transition(target) {
        return Err(ApiError::Conflict(format!(
            "Cannot change status from {} to {}",
            reservation.status, target
        )));
    }

    // Completion stamps the actual return time.
    let return_at = match target {
        ReservationStatus::Completed => Some(Utc::now()),
        _ => None,
    };

    let updated = state
        .reservations
        .update_status(id, target, return_at)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {} not found", id)))?;

    if target == ReservationStatus::Cancelled {
        if let Err(e) = state.notifier.reservation_cancelled(&updated).await {
            error!("Failed to send cancellation notice for {}: {}", id, e);
        }
    }

    info!(
        "Reservation status changed: id={}, {} -> {}",
        id, reservation.status, target
    );
    Ok(Json(updated))
}

/// Delete a reservation outright
pub async fn delete_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;

    if !state.reservations.delete(id).await? {
        return Err(ApiError::NotFound(format!(
            "Reservation {} not found",
            id
        )));
    }

    info!("Reservation deleted: id={}", id);
    Ok(Json(json!({ "deleted": true })))
}

async fn decide_license(state: &AppState, id: i64, approved: bool) -> ApiResult<Json<serde_json::Value>> {
    let license = state
        .catalog
        .set_license_approved(id, approved)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("License {} not found", id)))?;

    if let Err(e) = state
        .notifier
        .license_decided(license.user_id, approved)
        .await
    {
        error!("Failed to send license notice for {}: {}", id, e);
    }

    info!("License reviewed: id={}, approved={}", id, approved);
    Ok(Json(json!({ "id": license.id, "approved": license.approved })))
}

/// Approve a license submission
pub async fn approve_license(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    decide_license(&state, id, true).await
}

/// Reject a license submission
pub async fn reject_license(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    decide_license(&state, id, false).await
}

/// Dashboard headline numbers
pub async fn stats_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    Ok(Json(state.stats.dashboard().await?))
}

/// Monthly reservation counts
pub async fn stats_monthly(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    Ok(Json(state.stats.monthly().await?))
}

/// Daily reservation counts
pub async fn stats_daily(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    Ok(Json(state.stats.daily().await?))
}

/// Reservations by vehicle type
pub async fn stats_vehicle_types(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    Ok(Json(state.stats.vehicle_types().await?))
}

/// Reservations by pickup region
pub async fn stats_regions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    Ok(Json(state.stats.regions().await?))
}

/// Monthly revenue
pub async fn stats_revenue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&auth)?;
    Ok(Json(state.stats.revenue().await?))
}
