//! Catalog endpoints: cars, locations, hotels, and license submission

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::catalog::{Car, Hotel, License, Location, NewLicense};
use crate::state::AppState;

/// List available cars
pub async fn list_cars(State(state): State<AppState>) -> ApiResult<Json<Vec<Car>>> {
    Ok(Json(state.catalog.available_cars().await?))
}

/// List pickup locations
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Json<Vec<Location>>> {
    Ok(Json(state.catalog.all_locations().await?))
}

#[derive(Debug, Deserialize)]
pub struct HotelQuery {
    pub region: Option<String>,
}

/// List partner hotels, optionally filtered by region
pub async fn list_hotels(
    State(state): State<AppState>,
    Query(query): Query<HotelQuery>,
) -> ApiResult<Json<Vec<Hotel>>> {
    Ok(Json(state.catalog.hotels(query.region.as_deref()).await?))
}

/// List the caller's license submissions
pub async fn my_licenses(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<License>>> {
    Ok(Json(state.catalog.licenses_by_user(auth.id).await?))
}

/// Submit a driver license for review
pub async fn submit_license(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(new): Json<NewLicense>,
) -> ApiResult<(StatusCode, Json<License>)> {
    if new.license_number.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "License number is required".to_string(),
        ));
    }

    let license = state.catalog.insert_license(auth.id, &new).await?;
    info!(
        "License submitted: id={}, user_id={}",
        license.id, auth.id
    );
    Ok((StatusCode::CREATED, Json(license)))
}
