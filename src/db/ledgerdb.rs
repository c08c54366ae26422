// db/ledgerdb.rs
use async_trait::async_trait;
use sqlx::{types::BigDecimal, PgConnection};
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    models::workermodel::*,
    service::{
        error::ServiceError,
        ledger::{LedgerMovement, LedgerPosting},
    },
};

pub(crate) const WORKER_COLUMNS: &str = "id, user_id, balance, rating, verification_status, \
    total_jobs, is_available, created_at, updated_at";

pub(crate) const LEDGER_COLUMNS: &str = "id, worker_id, direction, amount, balance_before, \
    balance_after, reason, job_id, cashout_id, created_at";

#[async_trait]
pub trait LedgerExt: Send + Sync {
    async fn create_worker(&self, user_id: Uuid) -> Result<Worker, ServiceError>;

    async fn get_worker(&self, worker_id: Uuid) -> Result<Option<Worker>, ServiceError>;

    /// Applies one movement to a worker balance and journals it, atomically.
    async fn post(&self, posting: LedgerPosting) -> Result<LedgerEntry, ServiceError>;

    async fn get_ledger_entries(&self, worker_id: Uuid) -> Result<Vec<LedgerEntry>, ServiceError>;

    async fn credit(
        &self,
        worker_id: Uuid,
        amount: BigDecimal,
        reason: LedgerReason,
    ) -> Result<LedgerEntry, ServiceError> {
        self.post(LedgerPosting::new(worker_id, LedgerMovement::Credit(amount), reason))
            .await
    }

    async fn debit(
        &self,
        worker_id: Uuid,
        amount: BigDecimal,
        reason: LedgerReason,
    ) -> Result<LedgerEntry, ServiceError> {
        self.post(LedgerPosting::new(worker_id, LedgerMovement::Debit(amount), reason))
            .await
    }

    async fn guarded_debit(
        &self,
        worker_id: Uuid,
        amount: BigDecimal,
        reason: LedgerReason,
    ) -> Result<LedgerEntry, ServiceError> {
        self.post(LedgerPosting::new(worker_id, LedgerMovement::GuardedDebit(amount), reason))
            .await
    }
}

pub(crate) async fn worker_exists(conn: &mut PgConnection, worker_id: Uuid) -> Result<bool, ServiceError> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM workers WHERE id = $1")
        .bind(worker_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

/// Posts a movement inside the caller's transaction. The worker row stays
/// locked until that transaction ends, so concurrent postings serialize.
pub(crate) async fn post_in_tx(
    conn: &mut PgConnection,
    posting: &LedgerPosting,
) -> Result<LedgerEntry, ServiceError> {
    let worker = sqlx::query_as::<_, Worker>(&format!(
        "SELECT {} FROM workers WHERE id = $1 FOR UPDATE",
        WORKER_COLUMNS
    ))
    .bind(posting.worker_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ServiceError::WorkerNotFound(posting.worker_id))?;

    let balance_after = posting.movement.apply(&worker.balance)?;

    sqlx::query("UPDATE workers SET balance = $2, updated_at = NOW() WHERE id = $1")
        .bind(worker.id)
        .bind(&balance_after)
        .execute(&mut *conn)
        .await?;

    let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
        r#"
        INSERT INTO ledger_entries
        (worker_id, direction, amount, balance_before, balance_after, reason, job_id, cashout_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        LEDGER_COLUMNS
    ))
    .bind(worker.id)
    .bind(posting.movement.direction())
    .bind(posting.movement.amount())
    .bind(&worker.balance)
    .bind(&balance_after)
    .bind(posting.reason)
    .bind(posting.job_id)
    .bind(posting.cashout_id)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(
        "ledger {:?} {} on worker {}: {} -> {}",
        entry.direction,
        entry.amount,
        entry.worker_id,
        entry.balance_before,
        entry.balance_after
    );

    Ok(entry)
}

#[async_trait]
impl LedgerExt for DBClient {
    async fn create_worker(&self, user_id: Uuid) -> Result<Worker, ServiceError> {
        sqlx::query_as::<_, Worker>(&format!(
            r#"
            INSERT INTO workers (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {}
            "#,
            WORKER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            ServiceError::Validation(format!("User {} already has a worker account", user_id))
        })
    }

    async fn get_worker(&self, worker_id: Uuid) -> Result<Option<Worker>, ServiceError> {
        let worker = sqlx::query_as::<_, Worker>(&format!(
            "SELECT {} FROM workers WHERE id = $1",
            WORKER_COLUMNS
        ))
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(worker)
    }

    async fn post(&self, posting: LedgerPosting) -> Result<LedgerEntry, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let entry = post_in_tx(&mut tx, &posting).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn get_ledger_entries(&self, worker_id: Uuid) -> Result<Vec<LedgerEntry>, ServiceError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {} FROM ledger_entries
            WHERE worker_id = $1
            ORDER BY created_at ASC
            "#,
            LEDGER_COLUMNS
        ))
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
