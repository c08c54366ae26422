// handler/biddings.rs
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::{json_body, path_param, query_params};
use crate::{
    dtos::{biddingdtos::*, jobdtos::ApiResponse},
    error::HttpError,
    AppState,
};

pub fn bidding_handler() -> Router {
    Router::new()
        .route("/", post(place_bid).get(list_bids))
        .route("/:bid_id", get(get_bid))
        .route("/:bid_id/accept", put(accept_bid))
        .route("/:bid_id/reject", put(reject_bid))
}

pub async fn place_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Result<Json<PlaceBidDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(body)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bid = app_state.bidding_service.place_bid(body.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Bid placed successfully", bid)),
    ))
}

pub async fn list_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    query: Result<Query<BidQueryDto>, QueryRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let query = query_params(query)?;
    let bids = app_state
        .bidding_service
        .list_bids(query.job_id, query.worker_id)
        .await?;

    Ok(Json(ApiResponse::success("Bids retrieved successfully", bids)))
}

pub async fn get_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    bid_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let bid_id = path_param(bid_id)?;
    let bid = app_state.bidding_service.get_bid(bid_id).await?;

    Ok(Json(ApiResponse::success("Bid retrieved successfully", bid)))
}

pub async fn accept_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    bid_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let bid_id = path_param(bid_id)?;
    let acceptance = app_state.bidding_service.accept_bid(bid_id).await?;

    Ok(Json(ApiResponse::success(
        "Bid accepted and worker assigned",
        acceptance,
    )))
}

pub async fn reject_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    bid_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let bid_id = path_param(bid_id)?;
    let bid = app_state.bidding_service.reject_bid(bid_id).await?;

    Ok(Json(ApiResponse::success("Bid rejected", bid)))
}
