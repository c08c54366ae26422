// db/jobdb.rs
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{
    db::DBClient,
    ledgerdb::{post_in_tx, worker_exists},
};
use crate::{
    models::{jobmodel::*, revenuemodel::*},
    service::{
        error::ServiceError,
        job_lifecycle::JobStateMachine,
        settlement::{Settlement, SettlementPlan, SettlementTerms},
    },
};

pub(crate) const JOB_COLUMNS: &str = "id, client_id, category_id, title, description, location, \
    duration_type, duration_value, workers_needed, budget, job_type, payment_type, status, \
    start_date, created_at, updated_at";

pub(crate) const ASSIGNMENT_COLUMNS: &str = "id, job_id, worker_id, assigned_by_client, \
    assigned_by_admin, status, created_at, updated_at";

#[async_trait]
pub trait JobExt: Send + Sync {
    async fn create_job(&self, job: NewJob) -> Result<Job, ServiceError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, ServiceError>;

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, ServiceError>;

    async fn start_job(&self, job_id: Uuid) -> Result<Job, ServiceError>;

    async fn cancel_job(&self, job_id: Uuid) -> Result<Job, ServiceError>;

    /// Creates the job's assignment or replaces the worker on the existing one.
    async fn assign_worker(
        &self,
        job_id: Uuid,
        worker_id: Uuid,
        assigned_by: AssignedBy,
    ) -> Result<JobAssignment, ServiceError>;

    async fn get_assignment(&self, job_id: Uuid) -> Result<Option<JobAssignment>, ServiceError>;

    async fn list_assignments(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<JobAssignment>, ServiceError>;

    /// Marks the job completed and settles it in a single transaction.
    async fn complete_job(
        &self,
        job_id: Uuid,
        terms: &SettlementTerms,
    ) -> Result<Settlement, ServiceError>;

    async fn list_revenue(&self) -> Result<Vec<RevenueReport>, ServiceError>;
}

pub(crate) async fn lock_job(conn: &mut PgConnection, job_id: Uuid) -> Result<Job, ServiceError> {
    sqlx::query_as::<_, Job>(&format!(
        "SELECT {} FROM jobs WHERE id = $1 FOR UPDATE",
        JOB_COLUMNS
    ))
    .bind(job_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ServiceError::JobNotFound(job_id))
}

pub(crate) async fn set_job_status(
    conn: &mut PgConnection,
    job_id: Uuid,
    status: JobStatus,
) -> Result<Job, ServiceError> {
    let job = sqlx::query_as::<_, Job>(&format!(
        r#"
        UPDATE jobs
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        JOB_COLUMNS
    ))
    .bind(job_id)
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;

    Ok(job)
}

pub(crate) async fn find_assignment(
    conn: &mut PgConnection,
    job_id: Uuid,
) -> Result<Option<JobAssignment>, ServiceError> {
    let row = sqlx::query_as::<_, JobAssignmentRow>(&format!(
        "SELECT {} FROM job_assignments WHERE job_id = $1 FOR UPDATE",
        ASSIGNMENT_COLUMNS
    ))
    .bind(job_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(JobAssignment::try_from).transpose()?)
}

/// One assignment per job: a second assignment overwrites the first in place.
pub(crate) async fn upsert_assignment(
    conn: &mut PgConnection,
    job_id: Uuid,
    worker_id: Uuid,
    assigned_by: AssignedBy,
) -> Result<JobAssignment, ServiceError> {
    let row = sqlx::query_as::<_, JobAssignmentRow>(&format!(
        r#"
        INSERT INTO job_assignments (job_id, worker_id, assigned_by_client, assigned_by_admin)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (job_id) DO UPDATE
        SET worker_id = EXCLUDED.worker_id,
            assigned_by_client = EXCLUDED.assigned_by_client,
            assigned_by_admin = EXCLUDED.assigned_by_admin,
            status = 'assigned'::assignment_status,
            updated_at = NOW()
        RETURNING {}
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(job_id)
    .bind(worker_id)
    .bind(assigned_by.client_id())
    .bind(assigned_by.admin_id())
    .fetch_one(&mut *conn)
    .await?;

    Ok(JobAssignment::try_from(row)?)
}

async fn set_assignment_status(
    conn: &mut PgConnection,
    job_id: Uuid,
    status: AssignmentStatus,
) -> Result<(), ServiceError> {
    sqlx::query("UPDATE job_assignments SET status = $2, updated_at = NOW() WHERE job_id = $1")
        .bind(job_id)
        .bind(status)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, job: NewJob) -> Result<Job, ServiceError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs
            (client_id, category_id, title, description, location, duration_type, duration_value,
            workers_needed, budget, job_type, payment_type, start_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job.client_id)
        .bind(job.category_id)
        .bind(job.title)
        .bind(job.description)
        .bind(job.location)
        .bind(job.duration_type)
        .bind(job.duration_value)
        .bind(job.workers_needed)
        .bind(job.budget)
        .bind(job.job_type)
        .bind(job.payment_type)
        .bind(job.start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, ServiceError> {
        let job = sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, ServiceError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {} FROM jobs
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM job_assignments ja
                    WHERE ja.job_id = jobs.id AND ja.worker_id = $2))
              AND ($3::job_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
            JOB_COLUMNS
        ))
        .bind(filter.client_id)
        .bind(filter.worker_id)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn start_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let job = lock_job(&mut tx, job_id).await?;
        let status = JobStateMachine::transition(&job, JobStatus::InProgress)?;
        let job = set_job_status(&mut tx, job_id, status).await?;
        set_assignment_status(&mut tx, job_id, AssignmentStatus::InProgress).await?;

        tx.commit().await?;
        Ok(job)
    }

    async fn cancel_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let job = lock_job(&mut tx, job_id).await?;
        let status = JobStateMachine::transition(&job, JobStatus::Cancelled)?;
        let job = set_job_status(&mut tx, job_id, status).await?;

        tx.commit().await?;
        Ok(job)
    }

    async fn assign_worker(
        &self,
        job_id: Uuid,
        worker_id: Uuid,
        assigned_by: AssignedBy,
    ) -> Result<JobAssignment, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let job = lock_job(&mut tx, job_id).await?;
        let status = JobStateMachine::transition(&job, JobStatus::Assigned)?;

        if !worker_exists(&mut tx, worker_id).await? {
            return Err(ServiceError::WorkerNotFound(worker_id));
        }

        if job.status != status {
            set_job_status(&mut tx, job_id, status).await?;
        }
        let assignment = upsert_assignment(&mut tx, job_id, worker_id, assigned_by).await?;

        tx.commit().await?;
        Ok(assignment)
    }

    async fn get_assignment(&self, job_id: Uuid) -> Result<Option<JobAssignment>, ServiceError> {
        let row = sqlx::query_as::<_, JobAssignmentRow>(&format!(
            "SELECT {} FROM job_assignments WHERE job_id = $1",
            ASSIGNMENT_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(JobAssignment::try_from).transpose()?)
    }

    async fn list_assignments(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<JobAssignment>, ServiceError> {
        let rows = sqlx::query_as::<_, JobAssignmentRow>(&format!(
            r#"
            SELECT {} FROM job_assignments
            WHERE ($1::uuid IS NULL OR job_id = $1)
              AND ($2::uuid IS NULL OR worker_id = $2)
            ORDER BY created_at DESC
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(job_id)
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| JobAssignment::try_from(row).map_err(ServiceError::from))
            .collect()
    }

    async fn complete_job(
        &self,
        job_id: Uuid,
        terms: &SettlementTerms,
    ) -> Result<Settlement, ServiceError> {
        // Dropping `tx` on any early return rolls every step back.
        let mut tx = self.pool.begin().await?;

        let job = lock_job(&mut tx, job_id).await?;
        let status = JobStateMachine::transition(&job, JobStatus::Completed)?;
        let job = set_job_status(&mut tx, job_id, status).await?;

        let assignment = find_assignment(&mut tx, job_id).await?;
        let worker_id = assignment.as_ref().map(|a| a.worker_id);
        let plan = SettlementPlan::new(&job, terms, worker_id);

        let revenue = sqlx::query_as::<_, AdminRevenue>(
            r#"
            INSERT INTO admin_revenue (admin_id, job_id, commission_amount)
            VALUES ($1, $2, $3)
            RETURNING id, admin_id, job_id, commission_amount, created_at
            "#,
        )
        .bind(terms.admin_id)
        .bind(job_id)
        .bind(&plan.commission)
        .fetch_one(&mut *tx)
        .await?;

        let payout = match &plan.payout {
            Some(posting) => Some(post_in_tx(&mut tx, posting).await?),
            None => None,
        };

        if let Some(worker_id) = worker_id {
            set_assignment_status(&mut tx, job_id, AssignmentStatus::Completed).await?;
            sqlx::query("UPDATE workers SET total_jobs = total_jobs + 1, updated_at = NOW() WHERE id = $1")
                .bind(worker_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Settlement {
            job,
            revenue,
            worker_id,
            payout,
        })
    }

    async fn list_revenue(&self) -> Result<Vec<RevenueReport>, ServiceError> {
        let rows = sqlx::query_as::<_, RevenueReport>(
            r#"
            SELECT ar.id, ar.job_id, j.title AS job_title, ar.commission_amount, ar.created_at
            FROM admin_revenue ar
            JOIN jobs j ON ar.job_id = j.id
            ORDER BY ar.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
