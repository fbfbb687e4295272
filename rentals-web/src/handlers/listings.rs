//! Listing CRUD and search

use crate::error::ApiResult;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rentals_core::{Listing, ListingFilter, ListingPatch, NewListing};

pub async fn create_listing(
    State(state): State<AppState>,
    payload: Result<Json<NewListing>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new) = payload?;
    let listing = state.listings.create(new).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// `GET /listings?roomCount=2&pricePerMonthUSD=900`
pub async fn find_listings(
    State(state): State<AppState>,
    filter: Result<Query<ListingFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Listing>>> {
    let Query(filter) = filter?;
    Ok(Json(state.listings.find(&filter).await?))
}

pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Listing>> {
    Ok(Json(state.listings.get(&id).await?))
}

pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ListingPatch>, JsonRejection>,
) -> ApiResult<Json<Listing>> {
    let Json(patch) = payload?;
    Ok(Json(state.listings.update(&id, patch).await?))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.listings.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
