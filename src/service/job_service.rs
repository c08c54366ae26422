// service/job_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    dtos::jobdtos::{AssignWorkerDto, CreateJobDto},
    error::ErrorMessage,
    models::{jobmodel::*, revenuemodel::RevenueReport},
    service::{
        error::ServiceError,
        ledger::positive_money,
        retry::with_conflict_retry,
        settlement::{Settlement, SettlementTerms},
    },
};

#[derive(Debug, Clone)]
pub struct JobService {
    store: Arc<dyn MarketStore>,
    terms: SettlementTerms,
    max_retries: u32,
}

impl JobService {
    pub fn new(store: Arc<dyn MarketStore>, terms: SettlementTerms, max_retries: u32) -> Self {
        Self {
            store,
            terms,
            max_retries,
        }
    }

    pub async fn create_job(&self, dto: CreateJobDto) -> Result<Job, ServiceError> {
        let mut new_job = dto
            .into_new_job()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        new_job.budget = positive_money("budget", &new_job.budget)?;
        if new_job.workers_needed < 1 {
            return Err(ServiceError::Validation(
                "workers_needed must be at least 1".to_string(),
            ));
        }

        let job = self.store.create_job(new_job).await?;
        tracing::info!(
            "Job {} posted by client {} ({:?}, budget {})",
            job.id,
            job.client_id,
            job.job_type,
            job.budget
        );
        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, ServiceError> {
        self.store.list_jobs(filter).await
    }

    /// Binds a worker to a job, replacing any earlier assignment.
    /// `job_id` from the path or query wins over the one in the body.
    pub async fn assign_worker(
        &self,
        job_id: Option<Uuid>,
        dto: AssignWorkerDto,
    ) -> Result<JobAssignment, ServiceError> {
        let job_id = job_id
            .or(dto.job_id)
            .ok_or_else(|| ServiceError::Validation(ErrorMessage::JobIdRequired.to_string()))?;
        let worker_id = dto
            .worker_id
            .ok_or_else(|| ServiceError::Validation(ErrorMessage::NoWorkerSelected.to_string()))?;

        let assigned_by = match dto.assigned_by {
            Some(by) => by,
            None => AssignedBy::Client(self.get_job(job_id).await?.client_id),
        };

        let store = &self.store;
        let assignment = with_conflict_retry("assign_worker", self.max_retries, move || {
            store.assign_worker(job_id, worker_id, assigned_by)
        })
        .await
        .map_err(|e| {
            tracing::warn!("Assigning worker {} to job {} failed: {}", worker_id, job_id, e);
            e
        })?;

        tracing::info!(
            "Worker {} assigned to job {} by {:?}",
            worker_id,
            job_id,
            assigned_by
        );
        Ok(assignment)
    }

    pub async fn list_assignments(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<JobAssignment>, ServiceError> {
        self.store.list_assignments(job_id, worker_id).await
    }

    pub async fn start_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let store = &self.store;
        let job = with_conflict_retry("start_job", self.max_retries, move || {
            store.start_job(job_id)
        })
        .await?;

        tracing::info!("Job {} started", job_id);
        Ok(job)
    }

    pub async fn cancel_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let store = &self.store;
        let job = with_conflict_retry("cancel_job", self.max_retries, move || {
            store.cancel_job(job_id)
        })
        .await?;

        tracing::info!("Job {} cancelled", job_id);
        Ok(job)
    }

    /// Completes the job and settles it: records the platform commission and
    /// moves the worker's share. Nothing is written if any step fails.
    pub async fn complete_job(&self, job_id: Uuid) -> Result<Settlement, ServiceError> {
        let store = &self.store;
        let terms = &self.terms;
        let settlement = with_conflict_retry("complete_job", self.max_retries, move || {
            store.complete_job(job_id, terms)
        })
        .await
        .map_err(|e| {
            tracing::warn!("Settlement of job {} failed: {}", job_id, e);
            e
        })?;

        match &settlement.payout {
            Some(entry) => tracing::info!(
                "Job {} settled: commission {}, worker {} {:?} {} (balance {} -> {})",
                job_id,
                settlement.revenue.commission_amount,
                entry.worker_id,
                entry.direction,
                entry.amount,
                entry.balance_before,
                entry.balance_after
            ),
            None => tracing::info!(
                "Job {} settled without an assignment: commission {}",
                job_id,
                settlement.revenue.commission_amount
            ),
        }

        Ok(settlement)
    }

    pub async fn revenue_report(&self) -> Result<Vec<RevenueReport>, ServiceError> {
        self.store.list_revenue().await
    }
}
