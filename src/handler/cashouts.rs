// handler/cashouts.rs
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
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::{json_body, optional_json_body, path_param, query_params};
use crate::{
    dtos::{cashoutdtos::*, jobdtos::ApiResponse},
    error::HttpError,
    models::{cashoutmodel::CashoutRequest, workermodel::LedgerEntry},
    AppState,
};

pub fn cashout_handler() -> Router {
    Router::new()
        .route("/", post(request_cashout).get(list_cashouts))
        .route("/:cashout_id", get(get_cashout))
        .route("/:cashout_id/approve", put(approve_cashout))
        .route("/:cashout_id/reject", put(reject_cashout))
}

#[derive(Debug, Serialize)]
pub struct ApprovedCashout {
    pub request: CashoutRequest,
    pub ledger_entry: LedgerEntry,
}

pub async fn request_cashout(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Result<Json<CreateCashoutDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(body)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state.cashout_service.request_cashout(body.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Cashout request submitted", request)),
    ))
}

pub async fn list_cashouts(
    Extension(app_state): Extension<Arc<AppState>>,
    query: Result<Query<CashoutQueryDto>, QueryRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let query = query_params(query)?;
    let requests = app_state
        .cashout_service
        .list_cashouts(query.worker_id, query.status)
        .await?;

    Ok(Json(ApiResponse::success(
        "Cashout requests retrieved successfully",
        requests,
    )))
}

pub async fn get_cashout(
    Extension(app_state): Extension<Arc<AppState>>,
    cashout_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let cashout_id = path_param(cashout_id)?;
    let request = app_state.cashout_service.get_cashout(cashout_id).await?;

    Ok(Json(ApiResponse::success(
        "Cashout request retrieved successfully",
        request,
    )))
}

pub async fn approve_cashout(
    Extension(app_state): Extension<Arc<AppState>>,
    cashout_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CashoutDecisionDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let cashout_id = path_param(cashout_id)?;
    let decision = optional_json_body(body)?;
    let (request, ledger_entry) = app_state
        .cashout_service
        .approve_cashout(cashout_id, decision.into())
        .await?;

    Ok(Json(ApiResponse::success(
        "Cashout approved",
        ApprovedCashout {
            request,
            ledger_entry,
        },
    )))
}

pub async fn reject_cashout(
    Extension(app_state): Extension<Arc<AppState>>,
    cashout_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CashoutDecisionDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let cashout_id = path_param(cashout_id)?;
    let decision = optional_json_body(body)?;
    let request = app_state
        .cashout_service
        .reject_cashout(cashout_id, decision.into())
        .await?;

    Ok(Json(ApiResponse::success("Cashout rejected", request)))
}
