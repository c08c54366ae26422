// db/biddingdb.rs
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{
    db::DBClient,
    jobdb::{lock_job, set_job_status, upsert_assignment, JOB_COLUMNS},
    ledgerdb::{post_in_tx, worker_exists},
};
use crate::{
    models::jobmodel::*,
    service::{
        error::ServiceError,
        job_lifecycle::{ensure_open_for_bids, JobStateMachine},
        settlement::{BidAcceptance, BidPayoutTiming},
    },
};

const BID_COLUMNS: &str = "id, job_id, worker_id, bid_amount, message, status, created_at";

#[async_trait]
pub trait BiddingExt: Send + Sync {
    async fn place_bid(&self, bid: NewBid) -> Result<Bid, ServiceError>;

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, ServiceError>;

    async fn list_bids(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<Bid>, ServiceError>;

    /// Accepts a pending bid, assigns the bidder and, depending on `timing`,
    /// credits the bid amount. All or nothing.
    async fn accept_bid(
        &self,
        bid_id: Uuid,
        timing: BidPayoutTiming,
    ) -> Result<BidAcceptance, ServiceError>;

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError>;
}

async fn lock_bid(conn: &mut PgConnection, bid_id: Uuid) -> Result<Bid, ServiceError> {
    sqlx::query_as::<_, Bid>(&format!(
        "SELECT {} FROM bids WHERE id = $1 FOR UPDATE",
        BID_COLUMNS
    ))
    .bind(bid_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ServiceError::BidNotFound(bid_id))
}

async fn set_bid_status(
    conn: &mut PgConnection,
    bid_id: Uuid,
    status: BidStatus,
) -> Result<Bid, ServiceError> {
    let bid = sqlx::query_as::<_, Bid>(&format!(
        "UPDATE bids SET status = $2 WHERE id = $1 RETURNING {}",
        BID_COLUMNS
    ))
    .bind(bid_id)
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;

    Ok(bid)
}

#[async_trait]
impl BiddingExt for DBClient {
    async fn place_bid(&self, bid: NewBid) -> Result<Bid, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE id = $1 FOR SHARE",
            JOB_COLUMNS
        ))
        .bind(bid.job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::JobNotFound(bid.job_id))?;

        ensure_open_for_bids(&job)?;

        if !worker_exists(&mut tx, bid.worker_id).await? {
            return Err(ServiceError::WorkerNotFound(bid.worker_id));
        }

        let bid = sqlx::query_as::<_, Bid>(&format!(
            r#"
            INSERT INTO bids (job_id, worker_id, bid_amount, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BID_COLUMNS
        ))
        .bind(bid.job_id)
        .bind(bid.worker_id)
        .bind(bid.bid_amount)
        .bind(bid.message)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(bid)
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, ServiceError> {
        let bid = sqlx::query_as::<_, Bid>(&format!("SELECT {} FROM bids WHERE id = $1", BID_COLUMNS))
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(bid)
    }

    async fn list_bids(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<Bid>, ServiceError> {
        let bids = sqlx::query_as::<_, Bid>(&format!(
            r#"
            SELECT {} FROM bids
            WHERE ($1::uuid IS NULL OR job_id = $1)
              AND ($2::uuid IS NULL OR worker_id = $2)
            ORDER BY created_at DESC
            "#,
            BID_COLUMNS
        ))
        .bind(job_id)
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bids)
    }

    async fn accept_bid(
        &self,
        bid_id: Uuid,
        timing: BidPayoutTiming,
    ) -> Result<BidAcceptance, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let bid = lock_bid(&mut tx, bid_id).await?;
        bid.ensure_pending()?;

        let job = lock_job(&mut tx, bid.job_id).await?;
        ensure_open_for_bids(&job)?;
        let status = JobStateMachine::transition(&job, JobStatus::Assigned)?;

        let bid = set_bid_status(&mut tx, bid_id, BidStatus::Accepted).await?;
        let job = set_job_status(&mut tx, job.id, status).await?;
        let assignment =
            upsert_assignment(&mut tx, job.id, bid.worker_id, AssignedBy::Client(job.client_id))
                .await?;

        let payout = match timing.posting_for(&bid) {
            Some(posting) => Some(post_in_tx(&mut tx, &posting).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(BidAcceptance {
            bid,
            job,
            assignment,
            payout,
        })
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let bid = lock_bid(&mut tx, bid_id).await?;
        bid.ensure_pending()?;
        let bid = set_bid_status(&mut tx, bid_id, BidStatus::Rejected).await?;

        tx.commit().await?;
        Ok(bid)
    }
}
