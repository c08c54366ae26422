// db/cashoutdb.rs
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{
    db::DBClient,
    ledgerdb::{post_in_tx, worker_exists},
};
use crate::{
    models::{cashoutmodel::*, workermodel::*},
    service::{
        error::ServiceError,
        ledger::{LedgerMovement, LedgerPosting},
    },
};

const CASHOUT_COLUMNS: &str = "id, worker_id, amount, bank_name, bank_account, bank_routing, \
    status, admin_notes, processed_by, processed_at, created_at";

#[async_trait]
pub trait CashoutExt: Send + Sync {
    async fn create_cashout(&self, request: NewCashout) -> Result<CashoutRequest, ServiceError>;

    async fn get_cashout(&self, cashout_id: Uuid) -> Result<Option<CashoutRequest>, ServiceError>;

    async fn list_cashouts(
        &self,
        worker_id: Option<Uuid>,
        status: Option<CashoutStatus>,
    ) -> Result<Vec<CashoutRequest>, ServiceError>;

    /// Debits the requested amount, refusing to overdraw, and marks the
    /// request approved.
    async fn approve_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<(CashoutRequest, LedgerEntry), ServiceError>;

    async fn reject_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<CashoutRequest, ServiceError>;
}

async fn lock_pending_cashout(
    conn: &mut PgConnection,
    cashout_id: Uuid,
) -> Result<CashoutRequest, ServiceError> {
    let request = sqlx::query_as::<_, CashoutRequest>(&format!(
        "SELECT {} FROM cashout_requests WHERE id = $1 FOR UPDATE",
        CASHOUT_COLUMNS
    ))
    .bind(cashout_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ServiceError::CashoutNotFound(cashout_id))?;

    request.ensure_pending()?;
    Ok(request)
}

async fn decide(
    conn: &mut PgConnection,
    cashout_id: Uuid,
    status: CashoutStatus,
    decision: CashoutDecision,
) -> Result<CashoutRequest, ServiceError> {
    let request = sqlx::query_as::<_, CashoutRequest>(&format!(
        r#"
        UPDATE cashout_requests
        SET status = $2,
            processed_by = $3,
            admin_notes = COALESCE($4, admin_notes),
            processed_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        CASHOUT_COLUMNS
    ))
    .bind(cashout_id)
    .bind(status)
    .bind(decision.processed_by)
    .bind(decision.admin_notes)
    .fetch_one(&mut *conn)
    .await?;

    Ok(request)
}

#[async_trait]
impl CashoutExt for DBClient {
    async fn create_cashout(&self, request: NewCashout) -> Result<CashoutRequest, ServiceError> {
        let mut conn = self.pool.acquire().await?;

        if !worker_exists(&mut conn, request.worker_id).await? {
            return Err(ServiceError::WorkerNotFound(request.worker_id));
        }

        let request = sqlx::query_as::<_, CashoutRequest>(&format!(
            r#"
            INSERT INTO cashout_requests (worker_id, amount, bank_name, bank_account, bank_routing)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CASHOUT_COLUMNS
        ))
        .bind(request.worker_id)
        .bind(request.amount)
        .bind(request.bank_name)
        .bind(request.bank_account)
        .bind(request.bank_routing)
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    async fn get_cashout(&self, cashout_id: Uuid) -> Result<Option<CashoutRequest>, ServiceError> {
        let request = sqlx::query_as::<_, CashoutRequest>(&format!(
            "SELECT {} FROM cashout_requests WHERE id = $1",
            CASHOUT_COLUMNS
        ))
        .bind(cashout_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn list_cashouts(
        &self,
        worker_id: Option<Uuid>,
        status: Option<CashoutStatus>,
    ) -> Result<Vec<CashoutRequest>, ServiceError> {
        let requests = sqlx::query_as::<_, CashoutRequest>(&format!(
            r#"
            SELECT {} FROM cashout_requests
            WHERE ($1::uuid IS NULL OR worker_id = $1)
              AND ($2::cashout_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
            CASHOUT_COLUMNS
        ))
        .bind(worker_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn approve_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<(CashoutRequest, LedgerEntry), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let request = lock_pending_cashout(&mut tx, cashout_id).await?;

        let posting = LedgerPosting::new(
            request.worker_id,
            LedgerMovement::GuardedDebit(request.amount.clone()),
            LedgerReason::Cashout,
        )
        .for_cashout(request.id);
        let entry = post_in_tx(&mut tx, &posting).await?;

        let request = decide(&mut tx, cashout_id, CashoutStatus::Approved, decision).await?;

        tx.commit().await?;
        Ok((request, entry))
    }

    async fn reject_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<CashoutRequest, ServiceError> {
        let mut tx = self.pool.begin().await?;

        lock_pending_cashout(&mut tx, cashout_id).await?;
        let request = decide(&mut tx, cashout_id, CashoutStatus::Rejected, decision).await?;

        tx.commit().await?;
        Ok(request)
    }
}
