//! Account administration

use crate::error::ApiResult;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rentals_core::{Account, AccountPatch};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let account = state
        .accounts
        .create(&request.username, &request.password, &request.role)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list_accounts(State(state): State<AppState>) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(state.accounts.list().await?))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    Ok(Json(state.accounts.get(&id).await?))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AccountPatch>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let Json(patch) = payload?;
    Ok(Json(state.accounts.update(&id, patch).await?))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.accounts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
