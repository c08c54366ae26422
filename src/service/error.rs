use axum::http::StatusCode;
use sqlx::types::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use crate::{error::HttpError, models::jobmodel::JobStatus};

// SQLSTATE codes Postgres raises when concurrent transactions collide.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("Worker {0} not found")]
    WorkerNotFound(Uuid),

    #[error("Cashout request {0} not found")]
    CashoutNotFound(Uuid),

    #[error("Job {0} is {1} and cannot move to {2}")]
    InvalidJobStatus(Uuid, JobStatus, JobStatus),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: BigDecimal,
        available: BigDecimal,
    },

    #[error("{0} has already been processed")]
    AlreadyProcessed(String),

    #[error("Concurrent update conflict: {0}")]
    TransientConflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED {
                    return ServiceError::TransientConflict(db_err.message().to_string());
                }
            }
        }
        ServiceError::Database(err)
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::BidNotFound(_)
            | ServiceError::WorkerNotFound(_)
            | ServiceError::CashoutNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidJobStatus(_, _, _)
            | ServiceError::InsufficientBalance { .. }
            | ServiceError::AlreadyProcessed(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::TransientConflict(_) => StatusCode::CONFLICT,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::TransientConflict(_))
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if status.is_server_error() {
            tracing::error!("storage failure: {}", error);
        }
        HttpError::new(error.to_string(), status)
    }
}
