// handler/assignments.rs
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};

use super::{json_body, query_params};
use crate::{
    dtos::jobdtos::{ApiResponse, AssignWorkerDto, AssignmentQueryDto},
    error::{ErrorMessage, HttpError},
    AppState,
};

pub fn assignment_handler() -> Router {
    Router::new().route(
        "/",
        post(create_assignment)
            .put(update_assignment)
            .get(list_assignments),
    )
}

pub async fn create_assignment(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Result<Json<AssignWorkerDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(body)?;
    let assignment = app_state.job_service.assign_worker(None, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Worker assigned successfully", assignment)),
    ))
}

/// Replaces the worker on the job named by `?job_id=`.
pub async fn update_assignment(
    Extension(app_state): Extension<Arc<AppState>>,
    query: Result<Query<AssignmentQueryDto>, QueryRejection>,
    body: Result<Json<AssignWorkerDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let job_id = query_params(query)?
        .job_id
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::JobIdRequired.to_string()))?;
    let body = json_body(body)?;

    let assignment = app_state
        .job_service
        .assign_worker(Some(job_id), body)
        .await?;

    Ok(Json(ApiResponse::success(
        "Assignment updated successfully",
        assignment,
    )))
}

pub async fn list_assignments(
    Extension(app_state): Extension<Arc<AppState>>,
    query: Result<Query<AssignmentQueryDto>, QueryRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let query = query_params(query)?;
    let assignments = app_state
        .job_service
        .list_assignments(query.job_id, query.worker_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Assignments retrieved successfully",
        assignments,
    )))
}
