//! Registration and login handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use ipo_models::UserRecord;
use ipo_store::StoreError;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Bare acknowledgement body.
#[derive(Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Register a new user. Only the password hash is stored.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AckResponse>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = hash_password(&request.password)?;
    state
        .users
        .register(&request.username, UserRecord::new(password_hash))
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict("Username already exists"),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(AckResponse { ok: true })))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response.
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Exchange credentials for a bearer token.
///
/// Unknown username and wrong password produce the same response; neither
/// case is distinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let record = state.users.get(&request.username).await?;
    let verified = record
        .map(|r| verify_password(&request.password, &r.password_hash))
        .unwrap_or(false);
    if !verified {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let access_token = state.tokens.issue(&request.username)?;
    info!(username = %request.username, "login");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
