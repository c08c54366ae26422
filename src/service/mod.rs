pub mod bidding_service;
pub mod cashout_service;
pub mod error;
pub mod job_lifecycle;
pub mod job_service;
pub mod ledger;
pub mod retry;
pub mod settlement;
pub mod worker_service;

#[cfg(test)]
pub mod testing {
    use std::str::FromStr;

    use chrono::Utc;
    use sqlx::types::BigDecimal;
    use uuid::Uuid;

    use crate::{
        db::{ledgerdb::LedgerExt, MarketStore},
        models::{jobmodel::*, workermodel::*},
    };

    pub fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    pub fn sample_job(job_type: JobType) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            title: "Fix the roof".to_string(),
            description: "Replace broken tiles".to_string(),
            location: "Lagos".to_string(),
            duration_type: DurationType::Days,
            duration_value: Some(2),
            workers_needed: 1,
            budget: dec("10000"),
            job_type,
            payment_type: PaymentType::Online,
            status: JobStatus::Posted,
            start_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_job(job_type: JobType, payment_type: PaymentType, budget: &str) -> NewJob {
        NewJob {
            client_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            title: "Fix the roof".to_string(),
            description: "Replace broken tiles".to_string(),
            location: "Lagos".to_string(),
            duration_type: DurationType::Days,
            duration_value: None,
            workers_needed: 1,
            budget: dec(budget),
            job_type,
            payment_type,
            start_date: None,
        }
    }

    /// Opens a worker account and, for a non-zero balance, funds it with a
    /// manual adjustment.
    pub async fn seeded_worker(store: &dyn MarketStore, balance: &str) -> Worker {
        let worker = store.create_worker(Uuid::new_v4()).await.unwrap();
        let amount = dec(balance);
        if amount != BigDecimal::from(0) {
            store
                .credit(worker.id, amount, LedgerReason::ManualAdjustment)
                .await
                .unwrap();
        }
        store.get_worker(worker.id).await.unwrap().unwrap()
    }
}
