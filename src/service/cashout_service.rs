// service/cashout_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{cashoutmodel::*, workermodel::LedgerEntry},
    service::{
        error::ServiceError,
        ledger::positive_money,
        retry::with_conflict_retry,
    },
};

/// Withdrawals follow reserve-on-approval: a request leaves the balance
/// alone, approval debits it, rejection has no ledger effect.
#[derive(Debug, Clone)]
pub struct CashoutService {
    store: Arc<dyn MarketStore>,
    max_retries: u32,
}

impl CashoutService {
    pub fn new(store: Arc<dyn MarketStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    pub async fn request_cashout(&self, mut request: NewCashout) -> Result<CashoutRequest, ServiceError> {
        request.amount = positive_money("amount", &request.amount)?;
        if request.bank_name.trim().is_empty() || request.bank_account.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Bank name and account are required".to_string(),
            ));
        }

        let request = self.store.create_cashout(request).await?;
        tracing::info!(
            "Cashout {} of {} requested by worker {}",
            request.id,
            request.amount,
            request.worker_id
        );
        Ok(request)
    }

    pub async fn get_cashout(&self, cashout_id: Uuid) -> Result<CashoutRequest, ServiceError> {
        self.store
            .get_cashout(cashout_id)
            .await?
            .ok_or(ServiceError::CashoutNotFound(cashout_id))
    }

    pub async fn list_cashouts(
        &self,
        worker_id: Option<Uuid>,
        status: Option<CashoutStatus>,
    ) -> Result<Vec<CashoutRequest>, ServiceError> {
        self.store.list_cashouts(worker_id, status).await
    }

    pub async fn approve_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<(CashoutRequest, LedgerEntry), ServiceError> {
        let store = &self.store;
        let (request, entry) = with_conflict_retry("approve_cashout", self.max_retries, move || {
            store.approve_cashout(cashout_id, decision.clone())
        })
        .await
        .map_err(|e| {
            tracing::warn!("Approving cashout {} failed: {}", cashout_id, e);
            e
        })?;

        tracing::info!(
            "Cashout {} approved: worker {} balance {} -> {}",
            cashout_id,
            request.worker_id,
            entry.balance_before,
            entry.balance_after
        );
        Ok((request, entry))
    }

    pub async fn reject_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<CashoutRequest, ServiceError> {
        let store = &self.store;
        let request = with_conflict_retry("reject_cashout", self.max_retries, move || {
            store.reject_cashout(cashout_id, decision.clone())
        })
        .await?;

        tracing::info!("Cashout {} rejected", cashout_id);
        Ok(request)
    }
}
