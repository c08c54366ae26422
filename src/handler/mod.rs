pub mod assignments;
pub mod biddings;
pub mod cashouts;
pub mod jobs;
pub mod revenue;
pub mod workers;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Json, Path, Query},
};

use crate::error::HttpError;

/// Unwraps a JSON body, answering malformed payloads with a 400 envelope.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| HttpError::bad_request(rejection.body_text()))
}

/// Like `json_body`, but a request sent without a JSON body yields the default.
/// A body that is present and malformed is still a 400.
pub(crate) fn optional_json_body<T: Default>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, HttpError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(HttpError::bad_request(rejection.body_text())),
    }
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, HttpError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| HttpError::bad_request(rejection.body_text()))
}

pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, HttpError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| HttpError::bad_request(rejection.body_text()))
}
