use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::service::error::ServiceError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Posted,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Posted => "posted",
            JobStatus::Assigned => "assigned",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    DirectHire,
    Bidding,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Online,
    Manual,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "duration_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DurationType {
    Hours,
    Days,
    Weeks,
    Months,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub duration_type: DurationType,
    pub duration_value: Option<i32>,
    pub workers_needed: i32,
    pub budget: BigDecimal,
    pub job_type: JobType,
    pub payment_type: PaymentType,
    pub status: JobStatus,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated job ready to be persisted in `posted` state.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub duration_type: DurationType,
    pub duration_value: Option<i32>,
    pub workers_needed: i32,
    pub budget: BigDecimal,
    pub job_type: JobType,
    pub payment_type: PaymentType,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub client_id: Option<Uuid>,
    pub worker_id: Option<Uuid>,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "bid_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub bid_amount: BigDecimal,
    pub message: String,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Accepted and rejected bids are immutable.
    pub fn ensure_pending(&self) -> Result<(), ServiceError> {
        if self.status != BidStatus::Pending {
            return Err(ServiceError::AlreadyProcessed(format!("Bid {}", self.id)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewBid {
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub bid_amount: BigDecimal,
    pub message: String,
}

/// Who bound the worker to the job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AssignedBy {
    Client(Uuid),
    Admin(Uuid),
}

impl AssignedBy {
    pub fn client_id(&self) -> Option<Uuid> {
        match self {
            AssignedBy::Client(id) => Some(*id),
            AssignedBy::Admin(_) => None,
        }
    }

    pub fn admin_id(&self) -> Option<Uuid> {
        match self {
            AssignedBy::Admin(id) => Some(*id),
            AssignedBy::Client(_) => None,
        }
    }

    pub fn from_columns(client: Option<Uuid>, admin: Option<Uuid>) -> Option<Self> {
        match (client, admin) {
            (Some(id), None) => Some(AssignedBy::Client(id)),
            (None, Some(id)) => Some(AssignedBy::Admin(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobAssignment {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub assigned_by: AssignedBy,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Row shape of job_assignments; assigned_by is split over two nullable columns.
#[derive(Debug, sqlx::FromRow)]
pub struct JobAssignmentRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub assigned_by_client: Option<Uuid>,
    pub assigned_by_admin: Option<Uuid>,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobAssignmentRow> for JobAssignment {
    type Error = sqlx::Error;

    fn try_from(row: JobAssignmentRow) -> Result<Self, Self::Error> {
        let assigned_by = AssignedBy::from_columns(row.assigned_by_client, row.assigned_by_admin)
            .ok_or_else(|| {
                sqlx::Error::Decode(
                    format!("assignment {} must have exactly one assigner", row.id).into(),
                )
            })?;

        Ok(JobAssignment {
            id: row.id,
            job_id: row.job_id,
            worker_id: row.worker_id,
            assigned_by,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
