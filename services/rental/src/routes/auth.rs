//! Authentication endpoints: register, login, Kakao social login, and token
//! validation

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::models::NewUser;
use crate::state::AppState;
use crate::validation::{
    validate_display_name, validate_password, validate_phone_number, validate_username,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub birth_date: Option<chrono::NaiveDate>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct KakaoLoginRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user_id: uuid::Uuid,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

fn token_response(state: &AppState, user: &crate::models::User) -> ApiResult<TokenResponse> {
    let access_token = state.jwt.generate_token(user)?;
    Ok(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.token_expiry(),
        user_id: user.id,
        display_name: user.display_name.clone(),
        role: user.role.clone(),
    })
}

/// Register a new account and log it in
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    validate_username(&req.username).map_err(ApiError::BadRequest)?;
    validate_password(&req.password).map_err(ApiError::BadRequest)?;
    validate_display_name(&req.display_name).map_err(ApiError::BadRequest)?;
    if let Some(phone) = &req.phone_number {
        validate_phone_number(phone).map_err(ApiError::BadRequest)?;
    }

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    let user = state
        .users
        .create(&NewUser {
            username: req.username,
            password: req.password,
            display_name: req.display_name,
            birth_date: req.birth_date,
            phone_number: req.phone_number,
        })
        .await?;

    info!("User registered: {}", user.username);
    Ok((StatusCode::CREATED, Json(token_response(&state, &user)?)))
}

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid username or password".to_string()))?;

    if !state.users.verify_password(&user, &req.password)? {
        debug!("Password mismatch for user: {}", req.username);
        return Err(ApiError::BadRequest(
            "Invalid username or password".to_string(),
        ));
    }

    info!("User logged in: {}", user.username);
    Ok(Json(token_response(&state, &user)?))
}

/// Log in via Kakao: exchange the authorization code, fetch the profile,
/// and register the account on first sight
pub async fn kakao_login(
    State(state): State<AppState>,
    Json(req): Json<KakaoLoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let access_token = state.oauth.exchange_code(req.code).await.map_err(|e| {
        debug!("Kakao code exchange failed: {}", e);
        ApiError::BadRequest("Kakao authorization failed".to_string())
    })?;

    let profile = state
        .oauth
        .get_user_profile(&access_token)
        .await
        .map_err(|e| {
            debug!("Kakao profile fetch failed: {}", e);
            ApiError::BadRequest("Kakao authorization failed".to_string())
        })?;

    let nickname = profile.nickname.unwrap_or_else(|| "Kakao user".to_string());
    let user = state
        .users
        .find_or_create_by_kakao(profile.id, &nickname)
        .await?;

    info!("Kakao login: user_id={}", user.id);
    Ok(Json(token_response(&state, &user)?))
}

/// Check whether a token is valid
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<serde_json::Value> {
    match state.jwt.validate_token(&req.token) {
        Ok(claims) => Json(json!({
            "valid": true,
            "user_id": claims.sub,
            "role": claims.role,
        })),
        Err(_) => Json(json!({ "valid": false })),
    }
}
