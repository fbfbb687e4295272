//! HTTP handlers

pub mod accounts;
pub mod listings;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use rentals_core::{not_found_error, Account};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(credentials) = payload?;
    let token = state
        .authenticator
        .login(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

/// Self-registration; the new account is always a client
pub async fn new_client(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(credentials) = payload?;
    let account = state
        .accounts
        .register_client(&credentials.username, &credentials.password)
        .await?;
    info!(account_id = %account.id, "Client registered");
    Ok((StatusCode::CREATED, Json(account)))
}

/// The caller's own account
pub async fn profile(Extension(account): Extension<Account>) -> Json<Account> {
    Json(account)
}

/// Fallback for unknown paths
pub async fn not_found() -> ApiError {
    ApiError::from(not_found_error!("route", "http"))
}
