use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use crate::{error::ErrorMessage, models::jobmodel::*};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

// Job DTOs
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    pub client_id: Option<Uuid>,
    pub category_id: Option<Uuid>,

    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    pub duration_type: Option<DurationType>,

    #[validate(range(min = 1, message = "Duration must be at least 1"))]
    pub duration_value: Option<i32>,

    #[validate(range(min = 1, message = "At least one worker is needed"))]
    pub workers_needed: Option<i32>,

    pub budget: Option<BigDecimal>,
    pub job_type: Option<JobType>,
    pub payment_type: Option<PaymentType>,
    pub start_date: Option<NaiveDate>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CreateJobDto {
    /// Checks the required fields and applies defaults. Blank strings count as missing.
    pub fn into_new_job(self) -> Result<NewJob, ErrorMessage> {
        let title = present(self.title);
        let description = present(self.description);
        let location = present(self.location);

        let mut missing = Vec::new();
        if self.client_id.is_none() {
            missing.push("client_id");
        }
        if self.category_id.is_none() {
            missing.push("category_id");
        }
        if title.is_none() {
            missing.push("title");
        }
        if description.is_none() {
            missing.push("description");
        }
        if location.is_none() {
            missing.push("location");
        }
        if self.duration_type.is_none() {
            missing.push("duration_type");
        }
        if self.budget.is_none() {
            missing.push("budget");
        }
        if self.job_type.is_none() {
            missing.push("job_type");
        }

        match (
            self.client_id,
            self.category_id,
            title,
            description,
            location,
            self.duration_type,
            self.budget,
            self.job_type,
        ) {
            (
                Some(client_id),
                Some(category_id),
                Some(title),
                Some(description),
                Some(location),
                Some(duration_type),
                Some(budget),
                Some(job_type),
            ) => Ok(NewJob {
                client_id,
                category_id,
                title,
                description,
                location,
                duration_type,
                duration_value: self.duration_value,
                workers_needed: self.workers_needed.unwrap_or(1),
                budget,
                job_type,
                payment_type: self.payment_type.unwrap_or_default(),
                start_date: self.start_date,
            }),
            _ => Err(ErrorMessage::MissingRequiredFields(missing)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JobQueryDto {
    pub client_id: Option<Uuid>,
    pub worker_id: Option<Uuid>,
    pub status: Option<JobStatus>,
}

impl From<JobQueryDto> for JobFilter {
    fn from(query: JobQueryDto) -> Self {
        JobFilter {
            client_id: query.client_id,
            worker_id: query.worker_id,
            status: query.status,
        }
    }
}

// Assignment DTOs
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AssignWorkerDto {
    /// Required on create; on update the job comes from the query string.
    pub job_id: Option<Uuid>,
    pub worker_id: Option<Uuid>,
    /// Defaults to the job's client.
    pub assigned_by: Option<AssignedBy>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AssignmentQueryDto {
    pub job_id: Option<Uuid>,
    pub worker_id: Option<Uuid>,
}
