use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminRevenue {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub job_id: Uuid,
    pub commission_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RevenueReport {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub commission_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}
