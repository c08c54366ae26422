// handler/workers.rs
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::{json_body, path_param};
use crate::{
    dtos::{jobdtos::ApiResponse, workerdtos::*},
    error::HttpError,
    AppState,
};

pub fn worker_handler() -> Router {
    Router::new()
        .route("/", post(open_account))
        .route("/:worker_id", get(get_worker))
        .route("/:worker_id/balance", put(adjust_balance))
        .route("/:worker_id/ledger", get(get_ledger))
}

pub async fn open_account(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Result<Json<CreateWorkerDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(body)?;
    let worker = app_state.worker_service.open_account(body.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Worker account created", worker)),
    ))
}

pub async fn get_worker(
    Extension(app_state): Extension<Arc<AppState>>,
    worker_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let worker_id = path_param(worker_id)?;
    let worker = app_state.worker_service.get_worker(worker_id).await?;

    Ok(Json(ApiResponse::success("Worker retrieved successfully", worker)))
}

pub async fn adjust_balance(
    Extension(app_state): Extension<Arc<AppState>>,
    worker_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<BalanceAdjustmentDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let worker_id = path_param(worker_id)?;
    let body = json_body(body)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let entry = app_state
        .worker_service
        .adjust_balance(worker_id, body.amount)
        .await?;

    Ok(Json(ApiResponse::success("Balance updated successfully", entry)))
}

pub async fn get_ledger(
    Extension(app_state): Extension<Arc<AppState>>,
    worker_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let worker_id = path_param(worker_id)?;
    let entries = app_state.worker_service.ledger(worker_id).await?;

    Ok(Json(ApiResponse::success("Ledger retrieved successfully", entries)))
}
