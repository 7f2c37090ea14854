//! Reservation endpoints for regular users

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{NewReservation, Reservation, ReservationStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub car_id: i64,
    pub location_name: String,
    pub rental_at: String,
    pub return_at: Option<String>,
    pub passenger_count: Option<i32>,
    pub memo: Option<String>,
    pub total_amount: Option<i64>,
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid timestamp: {}", raw)))
}

/// Create a reservation. It is written CONFIRMED and the confirmation plus
/// reminder notifications are queued.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateReservationRequest>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    let rental_at = parse_instant(&req.rental_at)?;
    let return_at = req.return_at.as_deref().map(parse_instant).transpose()?;

    if let Some(return_at) = return_at {
        if return_at <= rental_at {
            return Err(ApiError::BadRequest(
                "Return time must be after the rental time".to_string(),
            ));
        }
    }

    if !state.catalog.car_exists(req.car_id).await? {
        return Err(ApiError::BadRequest(format!(
            "Unknown car: {}",
            req.car_id
        )));
    }

    let reservation = state
        .reservations
        .create(&NewReservation {
            user_id: auth.id,
            car_id: req.car_id,
            location_name: req.location_name,
            rental_at,
            return_at,
            passenger_count: req.passenger_count,
            memo: req.memo,
            status: ReservationStatus::Confirmed,
            total_amount: req.total_amount,
        })
        .await?;

    // Notification failures must not undo the booking.
    if let Err(e) = state.notifier.reservation_created(&reservation).await {
        error!(
            "Failed to queue notifications for reservation {}: {}",
            reservation.id, e
        );
    }

    info!(
        "Reservation created: id={}, user_id={}",
        reservation.id, reservation.user_id
    );
    Ok((StatusCode::CREATED, Json(reservation)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// List the caller's reservations, optionally filtered by status
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Reservation>>> {
    let reservations = match query.status {
        Some(raw) => {
            let status = raw
                .parse::<ReservationStatus>()
                .map_err(ApiError::BadRequest)?;
            state.reservations.find_by_user_and_status(auth.id, status).await?
        }
        None => state.reservations.find_by_user(auth.id).await?,
    };
    Ok(Json(reservations))
}

async fn owned_reservation(
    state: &AppState,
    auth: &AuthUser,
    id: i64,
) -> ApiResult<Reservation> {
    let reservation = state
        .reservations
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {} not found", id)))?;

    if reservation.user_id != auth.id && !auth.is_admin() {
        return Err(ApiError::Forbidden(
            "Not your reservation".to_string(),
        ));
    }

    Ok(reservation)
}

/// Fetch one of the caller's reservations
pub async fn get_one(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Reservation>> {
    Ok(Json(owned_reservation(&state, &auth, id).await?))
}

/// Cancel one of the caller's reservations. Users may only cancel before
/// pickup; later states need an admin.
pub async fn cancel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Reservation>> {
    let reservation = owned_reservation(&state, &auth, id).await?;

    if !auth.is_admin() && !reservation.status.user_cancellable() {
        return Err(ApiError::Conflict(format!(
            "Cannot cancel a {} reservation",
            reservation.status
        )));
    }
    if !reservation.status.can_transition(ReservationStatus::Cancelled) {
        return Err(ApiError::Conflict(
            "Reservation is already cancelled".to_string(),
        ));
    }

    let updated = state
        .reservations
        .update_status(id, ReservationStatus::Cancelled, None)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {} not found", id)))?;

    if let Err(e) = state.notifier.reservation_cancelled(&updated).await {
        error!("Failed to send cancellation notice for {}: {}", id, e);
    }

    info!("Reservation cancelled: id={}, user_id={}", id, auth.id);
    Ok(Json(updated))
}

/// Complete a reservation: stamps the return time and moves it to COMPLETED
pub async fn complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Reservation>> {
    let reservation = owned_reservation(&state, &auth, id).await?;

    if !reservation.status.can_transition(ReservationStatus::Completed) {
        return Err(ApiError::Conflict(format!(
            "Cannot complete a {} reservation",
            reservation.status
        )));
    }

    let updated = state
        .reservations
        .update_status(id, ReservationStatus::Completed, Some(Utc::now()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {} not found", id)))?;

    info!("Reservation completed: id={}", id);
    Ok(Json(updated))
}
