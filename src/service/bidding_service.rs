// service/bidding_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::jobmodel::{Bid, NewBid},
    service::{
        error::ServiceError,
        ledger::positive_money,
        retry::with_conflict_retry,
        settlement::{BidAcceptance, BidPayoutTiming},
    },
};

#[derive(Debug, Clone)]
pub struct BiddingService {
    store: Arc<dyn MarketStore>,
    payout_timing: BidPayoutTiming,
    max_retries: u32,
}

impl BiddingService {
    pub fn new(store: Arc<dyn MarketStore>, payout_timing: BidPayoutTiming, max_retries: u32) -> Self {
        Self {
            store,
            payout_timing,
            max_retries,
        }
    }

    pub async fn place_bid(&self, mut bid: NewBid) -> Result<Bid, ServiceError> {
        bid.bid_amount = positive_money("bid_amount", &bid.bid_amount)?;

        let bid = self.store.place_bid(bid).await?;
        tracing::info!(
            "Worker {} bid {} on job {}",
            bid.worker_id,
            bid.bid_amount,
            bid.job_id
        );
        Ok(bid)
    }

    pub async fn get_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        self.store
            .get_bid(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))
    }

    pub async fn list_bids(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<Bid>, ServiceError> {
        self.store.list_bids(job_id, worker_id).await
    }

    /// Accepting a bid assigns its worker to the job. Other bids on the job
    /// stay pending.
    pub async fn accept_bid(&self, bid_id: Uuid) -> Result<BidAcceptance, ServiceError> {
        let store = &self.store;
        let timing = self.payout_timing;
        let acceptance = with_conflict_retry("accept_bid", self.max_retries, move || {
            store.accept_bid(bid_id, timing)
        })
        .await
        .map_err(|e| {
            tracing::warn!("Accepting bid {} failed: {}", bid_id, e);
            e
        })?;

        tracing::info!(
            "Bid {} accepted: worker {} assigned to job {}{}",
            bid_id,
            acceptance.bid.worker_id,
            acceptance.job.id,
            acceptance
                .payout
                .as_ref()
                .map(|e| format!(", credited {}", e.amount))
                .unwrap_or_default()
        );
        Ok(acceptance)
    }

    pub async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        let store = &self.store;
        let bid = with_conflict_retry("reject_bid", self.max_retries, move || {
            store.reject_bid(bid_id)
        })
        .await?;

        tracing::info!("Bid {} rejected", bid_id);
        Ok(bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{jobdb::JobExt, ledgerdb::LedgerExt, memorydb::MemoryStore},
        models::{
            jobmodel::*,
            workermodel::{LedgerDirection, LedgerReason},
        },
        service::{
            job_service::JobService,
            settlement::SettlementTerms,
            testing::{dec, new_job, seeded_worker},
        },
    };

    fn service(store: Arc<MemoryStore>, timing: BidPayoutTiming) -> BiddingService {
        BiddingService::new(store, timing, 3)
    }

    fn bid_on(job: &Job, worker_id: Uuid, amount: &str) -> NewBid {
        NewBid {
            job_id: job.id,
            worker_id,
            bid_amount: dec(amount),
            message: "I can start tomorrow".to_string(),
        }
    }

    async fn bidding_job(store: &Arc<MemoryStore>) -> Job {
        store
            .create_job(new_job(JobType::Bidding, PaymentType::Online, "10000"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn accepting_a_bid_assigns_the_worker_and_leaves_siblings_pending() {
        let store = Arc::new(MemoryStore::new());
        let bids = service(store.clone(), BidPayoutTiming::OnCompletion);
        let job = bidding_job(&store).await;
        let alice = seeded_worker(store.as_ref(), "0").await;
        let bob = seeded_worker(store.as_ref(), "0").await;

        let winning = bids.place_bid(bid_on(&job, alice.id, "9000")).await.unwrap();
        let losing = bids.place_bid(bid_on(&job, bob.id, "9500")).await.unwrap();

        let acceptance = bids.accept_bid(winning.id).await.unwrap();
        assert_eq!(acceptance.bid.status, BidStatus::Accepted);
        assert_eq!(acceptance.job.status, JobStatus::Assigned);
        assert_eq!(acceptance.assignment.worker_id, alice.id);
        assert_eq!(acceptance.assignment.assigned_by, AssignedBy::Client(job.client_id));
        assert!(acceptance.payout.is_none());

        assert_eq!(bids.get_bid(losing.id).await.unwrap().status, BidStatus::Pending);
        let worker = store.get_worker(alice.id).await.unwrap().unwrap();
        assert_eq!(worker.balance, dec("0"));
    }

    #[tokio::test]
    async fn only_one_bid_per_job_can_be_accepted() {
        let store = Arc::new(MemoryStore::new());
        let bids = service(store.clone(), BidPayoutTiming::OnCompletion);
        let job = bidding_job(&store).await;
        let alice = seeded_worker(store.as_ref(), "0").await;
        let bob = seeded_worker(store.as_ref(), "0").await;

        let first = bids.place_bid(bid_on(&job, alice.id, "9000")).await.unwrap();
        let second = bids.place_bid(bid_on(&job, bob.id, "8000")).await.unwrap();

        bids.accept_bid(first.id).await.unwrap();
        let err = bids.accept_bid(second.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let accepted: Vec<_> = bids
            .list_bids(Some(job.id), None)
            .await
            .unwrap()
            .into_iter()
            .filter(|b| b.status == BidStatus::Accepted)
            .collect();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, first.id);
        assert_eq!(
            store.get_assignment(job.id).await.unwrap().unwrap().worker_id,
            alice.id
        );
    }

    #[tokio::test]
    async fn decided_bids_are_already_processed() {
        let store = Arc::new(MemoryStore::new());
        let bids = service(store.clone(), BidPayoutTiming::OnCompletion);
        let job = bidding_job(&store).await;
        let worker = seeded_worker(store.as_ref(), "0").await;

        let bid = bids.place_bid(bid_on(&job, worker.id, "500")).await.unwrap();
        assert_eq!(bids.reject_bid(bid.id).await.unwrap().status, BidStatus::Rejected);

        assert!(matches!(
            bids.reject_bid(bid.id).await,
            Err(ServiceError::AlreadyProcessed(_))
        ));
        assert!(matches!(
            bids.accept_bid(bid.id).await,
            Err(ServiceError::AlreadyProcessed(_))
        ));
        assert!(matches!(
            bids.accept_bid(Uuid::new_v4()).await,
            Err(ServiceError::BidNotFound(_))
        ));
    }

    #[tokio::test]
    async fn bids_only_go_to_posted_bidding_jobs() {
        let store = Arc::new(MemoryStore::new());
        let bids = service(store.clone(), BidPayoutTiming::OnCompletion);
        let worker = seeded_worker(store.as_ref(), "0").await;
        let direct = store
            .create_job(new_job(JobType::DirectHire, PaymentType::Online, "100"))
            .await
            .unwrap();

        assert!(matches!(
            bids.place_bid(bid_on(&direct, worker.id, "90")).await,
            Err(ServiceError::Validation(_))
        ));

        let job = bidding_job(&store).await;
        assert!(matches!(
            bids.place_bid(bid_on(&job, worker.id, "0")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            bids.place_bid(bid_on(&job, worker.id, "0.004")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            bids.place_bid(bid_on(&job, Uuid::new_v4(), "90")).await,
            Err(ServiceError::WorkerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn immediate_timing_credits_bid_amount_on_acceptance() {
        let store = Arc::new(MemoryStore::new());
        let bids = service(store.clone(), BidPayoutTiming::Immediate);
        let job = bidding_job(&store).await;
        let worker = seeded_worker(store.as_ref(), "100").await;

        let bid = bids.place_bid(bid_on(&job, worker.id, "9000")).await.unwrap();
        let acceptance = bids.accept_bid(bid.id).await.unwrap();

        let payout = acceptance.payout.unwrap();
        assert_eq!(payout.direction, LedgerDirection::Credit);
        assert_eq!(payout.reason, LedgerReason::BidAcceptance);
        assert_eq!(payout.balance_after, dec("9100"));
    }

    #[tokio::test]
    async fn accepted_bid_job_settles_like_any_other() {
        let store = Arc::new(MemoryStore::new());
        let bids = service(store.clone(), BidPayoutTiming::OnCompletion);
        let jobs = JobService::new(store.clone(), SettlementTerms::default(), 3);
        let job = bidding_job(&store).await;
        let worker = seeded_worker(store.as_ref(), "500").await;

        let bid = bids.place_bid(bid_on(&job, worker.id, "9000")).await.unwrap();
        bids.accept_bid(bid.id).await.unwrap();
        jobs.complete_job(job.id).await.unwrap();

        let worker = store.get_worker(worker.id).await.unwrap().unwrap();
        assert_eq!(worker.balance, dec("9000"));
    }
}
