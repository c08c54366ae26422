// db/db.rs
use sqlx::{Pool, Postgres};

use super::MarketStore;

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("size", &self.pool.size())
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    /// Applies the bundled migrations in `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

impl MarketStore for DBClient {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::*;
    use crate::{
        db::{biddingdb::BiddingExt, cashoutdb::CashoutExt, jobdb::JobExt, ledgerdb::LedgerExt},
        models::{cashoutmodel::*, jobmodel::*, workermodel::LedgerReason},
        service::{
            error::ServiceError,
            settlement::{BidPayoutTiming, SettlementTerms},
            testing::{dec, new_job, seeded_worker},
        },
    };

    fn test_db_url() -> Option<String> {
        std::env::var("DATABASE_URL").ok()
    }

    async fn setup_client() -> Option<DBClient> {
        let url = test_db_url()?;
        let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.ok()?;
        let client = DBClient::new(pool);
        client.migrate().await.ok()?;
        Some(client)
    }

    #[tokio::test]
    async fn online_settlement_is_persisted() {
        let Some(client) = setup_client().await else {
            return;
        };
        let worker = seeded_worker(&client, "500").await;
        let job = client
            .create_job(new_job(JobType::DirectHire, PaymentType::Online, "10000"))
            .await
            .unwrap();
        client
            .assign_worker(job.id, worker.id, AssignedBy::Client(job.client_id))
            .await
            .unwrap();

        let settlement = client
            .complete_job(job.id, &SettlementTerms::default())
            .await
            .unwrap();

        assert_eq!(settlement.revenue.commission_amount, dec("1500"));
        let worker = client.get_worker(worker.id).await.unwrap().unwrap();
        assert_eq!(worker.balance, dec("9000"));
        assert_eq!(worker.total_jobs, 1);

        assert!(matches!(
            client.complete_job(job.id, &SettlementTerms::default()).await,
            Err(ServiceError::InvalidJobStatus(..))
        ));
    }

    #[tokio::test]
    async fn failed_manual_settlement_rolls_back() {
        let Some(client) = setup_client().await else {
            return;
        };
        let worker = seeded_worker(&client, "100").await;
        let job = client
            .create_job(new_job(JobType::DirectHire, PaymentType::Manual, "10000"))
            .await
            .unwrap();
        client
            .assign_worker(job.id, worker.id, AssignedBy::Admin(Uuid::new_v4()))
            .await
            .unwrap();

        let err = client
            .complete_job(job.id, &SettlementTerms::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientBalance { .. }));

        let job = client.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Assigned);
        let revenue = client.list_revenue().await.unwrap();
        assert!(revenue.iter().all(|r| r.job_id != job.id));
        let worker = client.get_worker(worker.id).await.unwrap().unwrap();
        assert_eq!(worker.balance, dec("100"));
    }

    #[tokio::test]
    async fn second_bid_cannot_be_accepted() {
        let Some(client) = setup_client().await else {
            return;
        };
        let alice = seeded_worker(&client, "0").await;
        let bob = seeded_worker(&client, "0").await;
        let job = client
            .create_job(new_job(JobType::Bidding, PaymentType::Online, "800"))
            .await
            .unwrap();

        let bid = |worker_id| NewBid {
            job_id: job.id,
            worker_id,
            bid_amount: dec("750"),
            message: String::new(),
        };
        let first = client.place_bid(bid(alice.id)).await.unwrap();
        let second = client.place_bid(bid(bob.id)).await.unwrap();

        let acceptance = client
            .accept_bid(first.id, BidPayoutTiming::Immediate)
            .await
            .unwrap();
        assert_eq!(acceptance.payout.unwrap().balance_after, dec("750"));

        assert!(matches!(
            client.accept_bid(second.id, BidPayoutTiming::Immediate).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(
            client.get_bid(second.id).await.unwrap().unwrap().status,
            BidStatus::Pending
        );
    }

    #[tokio::test]
    async fn concurrent_cashout_approvals_never_overdraw() {
        let Some(client) = setup_client().await else {
            return;
        };
        let client = Arc::new(client);
        let worker = seeded_worker(client.as_ref(), "1000").await;

        let mut ids = Vec::new();
        for _ in 0..2 {
            let request = client
                .create_cashout(NewCashout {
                    worker_id: worker.id,
                    amount: dec("700"),
                    bank_name: "First Bank".into(),
                    bank_account: "0123456789".into(),
                    bank_routing: None,
                })
                .await
                .unwrap();
            ids.push(request.id);
        }

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let client = client.clone();
                let id = *id;
                tokio::spawn(async move { client.approve_cashout(id, CashoutDecision::default()).await })
            })
            .collect();

        let mut approved = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => approved += 1,
                Err(ServiceError::InsufficientBalance { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(approved, 1);
        let worker = client.get_worker(worker.id).await.unwrap().unwrap();
        assert_eq!(worker.balance, dec("300"));

        let entries = client.get_ledger_entries(worker.id).await.unwrap();
        assert_eq!(entries.last().unwrap().reason, LedgerReason::Cashout);
    }
}
