use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::service::error::ServiceError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "cashout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CashoutStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CashoutRequest {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub amount: BigDecimal,
    pub bank_name: String,
    pub bank_account: String,
    pub bank_routing: Option<String>,
    pub status: CashoutStatus,
    pub admin_notes: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CashoutRequest {
    pub fn ensure_pending(&self) -> Result<(), ServiceError> {
        if self.status != CashoutStatus::Pending {
            return Err(ServiceError::AlreadyProcessed(format!(
                "Cashout request {}",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewCashout {
    pub worker_id: Uuid,
    pub amount: BigDecimal,
    pub bank_name: String,
    pub bank_account: String,
    pub bank_routing: Option<String>,
}

/// Admin metadata recorded when a request is approved or rejected.
#[derive(Debug, Clone, Default)]
pub struct CashoutDecision {
    pub processed_by: Option<Uuid>,
    pub admin_notes: Option<String>,
}
