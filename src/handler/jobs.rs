// handler/jobs.rs
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
    dtos::jobdtos::*,
    error::HttpError,
    AppState,
};

pub fn job_handler() -> Router {
    Router::new()
        .route("/", post(create_job).get(list_jobs))
        .route("/:job_id", get(get_job))
        .route("/:job_id/start", put(start_job))
        .route("/:job_id/complete", put(complete_job))
        .route("/:job_id/cancel", put(cancel_job))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Result<Json<CreateJobDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(body)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.create_job(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job created successfully", job)),
    ))
}

pub async fn list_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    query: Result<Query<JobQueryDto>, QueryRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let query = query_params(query)?;
    let jobs = app_state.job_service.list_jobs(query.into()).await?;

    Ok(Json(ApiResponse::success("Jobs retrieved successfully", jobs)))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    job_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let job_id = path_param(job_id)?;
    let job = app_state.job_service.get_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job retrieved successfully", job)))
}

pub async fn start_job(
    Extension(app_state): Extension<Arc<AppState>>,
    job_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let job_id = path_param(job_id)?;
    let job = app_state.job_service.start_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job started", job)))
}

pub async fn complete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    job_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let job_id = path_param(job_id)?;
    let settlement = app_state.job_service.complete_job(job_id).await?;

    Ok(Json(ApiResponse::success(
        "Job completed and payment processed successfully",
        settlement,
    )))
}

pub async fn cancel_job(
    Extension(app_state): Extension<Arc<AppState>>,
    job_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let job_id = path_param(job_id)?;
    let job = app_state.job_service.cancel_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job cancelled", job)))
}
