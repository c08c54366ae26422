// handler/revenue.rs
use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{dtos::jobdtos::ApiResponse, error::HttpError, AppState};

pub fn admin_handler() -> Router {
    Router::new().route("/revenue", get(get_revenue))
}

pub async fn get_revenue(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let revenue = app_state.job_service.revenue_report().await?;

    Ok(Json(ApiResponse::success("Revenue retrieved successfully", revenue)))
}
