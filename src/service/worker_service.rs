// service/worker_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::workermodel::*,
    service::{
        error::ServiceError,
        ledger::positive_money,
        retry::with_conflict_retry,
    },
};

#[derive(Debug, Clone)]
pub struct WorkerService {
    store: Arc<dyn MarketStore>,
    max_retries: u32,
}

impl WorkerService {
    pub fn new(store: Arc<dyn MarketStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Opens a zero-balance ledger account for a user registered elsewhere.
    pub async fn open_account(&self, user_id: Uuid) -> Result<Worker, ServiceError> {
        let worker = self.store.create_worker(user_id).await?;
        tracing::info!("Worker account {} opened for user {}", worker.id, user_id);
        Ok(worker)
    }

    pub async fn get_worker(&self, worker_id: Uuid) -> Result<Worker, ServiceError> {
        self.store
            .get_worker(worker_id)
            .await?
            .ok_or(ServiceError::WorkerNotFound(worker_id))
    }

    /// Admin top-up of a worker balance.
    pub async fn adjust_balance(
        &self,
        worker_id: Uuid,
        amount: BigDecimal,
    ) -> Result<LedgerEntry, ServiceError> {
        let amount = positive_money("amount", &amount)?;

        let store = &self.store;
        let entry = with_conflict_retry("adjust_balance", self.max_retries, move || {
            store.credit(worker_id, amount.clone(), LedgerReason::ManualAdjustment)
        })
        .await?;

        tracing::info!(
            "Balance of worker {} adjusted by {}: {} -> {}",
            worker_id,
            entry.amount,
            entry.balance_before,
            entry.balance_after
        );
        Ok(entry)
    }

    pub async fn ledger(&self, worker_id: Uuid) -> Result<Vec<LedgerEntry>, ServiceError> {
        self.get_worker(worker_id).await?;
        self.store.get_ledger_entries(worker_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memorydb::MemoryStore, service::testing::dec};

    #[tokio::test]
    async fn adjustments_are_journaled_in_order() {
        let workers = WorkerService::new(Arc::new(MemoryStore::new()), 3);
        let worker = workers.open_account(Uuid::new_v4()).await.unwrap();
        assert_eq!(worker.balance, dec("0"));

        workers.adjust_balance(worker.id, dec("250.505")).await.unwrap();
        workers.adjust_balance(worker.id, dec("100")).await.unwrap();

        let worker = workers.get_worker(worker.id).await.unwrap();
        assert_eq!(worker.balance, dec("350.51"));

        let ledger = workers.ledger(worker.id).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].amount, dec("250.51"));
        assert_eq!(ledger[1].balance_before, dec("250.51"));
        assert_eq!(ledger[1].balance_after, dec("350.51"));
        assert!(ledger.iter().all(|e| e.reason == LedgerReason::ManualAdjustment));
    }

    #[tokio::test]
    async fn adjustment_must_be_positive_and_target_a_worker() {
        let workers = WorkerService::new(Arc::new(MemoryStore::new()), 3);
        let worker = workers.open_account(Uuid::new_v4()).await.unwrap();

        assert!(matches!(
            workers.adjust_balance(worker.id, dec("-5")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            workers.adjust_balance(worker.id, dec("0.001")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(workers.ledger(worker.id).await.unwrap().is_empty());
        assert!(matches!(
            workers.adjust_balance(Uuid::new_v4(), dec("5")).await,
            Err(ServiceError::WorkerNotFound(_))
        ));
        assert!(matches!(
            workers.ledger(Uuid::new_v4()).await,
            Err(ServiceError::WorkerNotFound(_))
        ));
    }
}
