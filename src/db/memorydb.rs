// db/memorydb.rs
use async_trait::async_trait;
use chrono::Utc;
use num_traits::Zero;
use sqlx::types::BigDecimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    biddingdb::BiddingExt, cashoutdb::CashoutExt, jobdb::JobExt, ledgerdb::LedgerExt, MarketStore,
};
use crate::{
    models::{cashoutmodel::*, jobmodel::*, revenuemodel::*, workermodel::*},
    service::{
        error::ServiceError,
        job_lifecycle::{ensure_open_for_bids, JobStateMachine},
        ledger::{LedgerMovement, LedgerPosting},
        settlement::{BidAcceptance, BidPayoutTiming, Settlement, SettlementPlan, SettlementTerms},
    },
};

/// Process-local store used when no database is configured, and by tests.
///
/// Every write works on a copy of the state and only replaces the live state
/// once the whole operation has succeeded, which gives the same
/// all-or-nothing behaviour as a Postgres transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    workers: Vec<Worker>,
    jobs: Vec<Job>,
    bids: Vec<Bid>,
    assignments: Vec<JobAssignment>,
    cashouts: Vec<CashoutRequest>,
    revenue: Vec<AdminRevenue>,
    ledger: Vec<LedgerEntry>,
}

impl MemoryState {
    fn job_mut(&mut self, job_id: Uuid) -> Result<&mut Job, ServiceError> {
        self.jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    fn bid_mut(&mut self, bid_id: Uuid) -> Result<&mut Bid, ServiceError> {
        self.bids
            .iter_mut()
            .find(|b| b.id == bid_id)
            .ok_or(ServiceError::BidNotFound(bid_id))
    }

    fn worker_mut(&mut self, worker_id: Uuid) -> Result<&mut Worker, ServiceError> {
        self.workers
            .iter_mut()
            .find(|w| w.id == worker_id)
            .ok_or(ServiceError::WorkerNotFound(worker_id))
    }

    fn pending_cashout_mut(&mut self, cashout_id: Uuid) -> Result<&mut CashoutRequest, ServiceError> {
        let request = self
            .cashouts
            .iter_mut()
            .find(|c| c.id == cashout_id)
            .ok_or(ServiceError::CashoutNotFound(cashout_id))?;
        request.ensure_pending()?;
        Ok(request)
    }

    fn set_job_status(&mut self, job_id: Uuid, to: JobStatus) -> Result<Job, ServiceError> {
        let job = self.job_mut(job_id)?;
        let status = JobStateMachine::transition(job, to)?;
        job.status = status;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    fn set_assignment_status(&mut self, job_id: Uuid, status: AssignmentStatus) {
        if let Some(assignment) = self.assignments.iter_mut().find(|a| a.job_id == job_id) {
            assignment.status = status;
            assignment.updated_at = Utc::now();
        }
    }

    fn upsert_assignment(
        &mut self,
        job_id: Uuid,
        worker_id: Uuid,
        assigned_by: AssignedBy,
    ) -> JobAssignment {
        let now = Utc::now();
        if let Some(existing) = self.assignments.iter_mut().find(|a| a.job_id == job_id) {
            existing.worker_id = worker_id;
            existing.assigned_by = assigned_by;
            existing.status = AssignmentStatus::Assigned;
            existing.updated_at = now;
            return existing.clone();
        }

        let assignment = JobAssignment {
            id: Uuid::new_v4(),
            job_id,
            worker_id,
            assigned_by,
            status: AssignmentStatus::Assigned,
            created_at: now,
            updated_at: now,
        };
        self.assignments.push(assignment.clone());
        assignment
    }

    fn post(&mut self, posting: &LedgerPosting) -> Result<LedgerEntry, ServiceError> {
        let worker = self.worker_mut(posting.worker_id)?;
        let balance_before = worker.balance.clone();
        let balance_after = posting.movement.apply(&balance_before)?;
        worker.balance = balance_after.clone();
        worker.updated_at = Utc::now();

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            worker_id: posting.worker_id,
            direction: posting.movement.direction(),
            amount: posting.movement.amount().clone(),
            balance_before,
            balance_after,
            reason: posting.reason,
            job_id: posting.job_id,
            cashout_id: posting.cashout_id,
            created_at: Utc::now(),
        };
        self.ledger.push(entry.clone());
        Ok(entry)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transact<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut MemoryState) -> Result<T, ServiceError> + Send,
        T: Send,
    {
        let mut state = self.state.lock().await;
        let mut draft = state.clone();
        let out = op(&mut draft)?;
        *state = draft;
        Ok(out)
    }
}

impl MarketStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl LedgerExt for MemoryStore {
    async fn create_worker(&self, user_id: Uuid) -> Result<Worker, ServiceError> {
        self.transact(|state| {
            if state.workers.iter().any(|w| w.user_id == user_id) {
                return Err(ServiceError::Validation(format!(
                    "User {} already has a worker account",
                    user_id
                )));
            }

            let now = Utc::now();
            let worker = Worker {
                id: Uuid::new_v4(),
                user_id,
                balance: BigDecimal::zero(),
                rating: 0.0,
                verification_status: VerificationStatus::Pending,
                total_jobs: 0,
                is_available: true,
                created_at: now,
                updated_at: now,
            };
            state.workers.push(worker.clone());
            Ok(worker)
        })
        .await
    }

    async fn get_worker(&self, worker_id: Uuid) -> Result<Option<Worker>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.workers.iter().find(|w| w.id == worker_id).cloned())
    }

    async fn post(&self, posting: LedgerPosting) -> Result<LedgerEntry, ServiceError> {
        self.transact(|state| state.post(&posting)).await
    }

    async fn get_ledger_entries(&self, worker_id: Uuid) -> Result<Vec<LedgerEntry>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .ledger
            .iter()
            .filter(|e| e.worker_id == worker_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_job(&self, job: NewJob) -> Result<Job, ServiceError> {
        self.transact(|state| {
            let now = Utc::now();
            let job = Job {
                id: Uuid::new_v4(),
                client_id: job.client_id,
                category_id: job.category_id,
                title: job.title,
                description: job.description,
                location: job.location,
                duration_type: job.duration_type,
                duration_value: job.duration_value,
                workers_needed: job.workers_needed,
                budget: job.budget,
                job_type: job.job_type,
                payment_type: job.payment_type,
                status: JobStatus::Posted,
                start_date: job.start_date,
                created_at: now,
                updated_at: now,
            };
            state.jobs.push(job.clone());
            Ok(job)
        })
        .await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, ServiceError> {
        let state = self.state.lock().await;
        let jobs = state
            .jobs
            .iter()
            .rev()
            .filter(|j| filter.client_id.map_or(true, |id| j.client_id == id))
            .filter(|j| filter.status.map_or(true, |s| j.status == s))
            .filter(|j| {
                filter.worker_id.map_or(true, |worker_id| {
                    state
                        .assignments
                        .iter()
                        .any(|a| a.job_id == j.id && a.worker_id == worker_id)
                })
            })
            .cloned()
            .collect();
        Ok(jobs)
    }

    async fn start_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.transact(|state| {
            let job = state.set_job_status(job_id, JobStatus::InProgress)?;
            state.set_assignment_status(job_id, AssignmentStatus::InProgress);
            Ok(job)
        })
        .await
    }

    async fn cancel_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.transact(|state| state.set_job_status(job_id, JobStatus::Cancelled))
            .await
    }

    async fn assign_worker(
        &self,
        job_id: Uuid,
        worker_id: Uuid,
        assigned_by: AssignedBy,
    ) -> Result<JobAssignment, ServiceError> {
        self.transact(|state| {
            state.set_job_status(job_id, JobStatus::Assigned)?;
            state.worker_mut(worker_id)?;
            Ok(state.upsert_assignment(job_id, worker_id, assigned_by))
        })
        .await
    }

    async fn get_assignment(&self, job_id: Uuid) -> Result<Option<JobAssignment>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.assignments.iter().find(|a| a.job_id == job_id).cloned())
    }

    async fn list_assignments(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<JobAssignment>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .rev()
            .filter(|a| job_id.map_or(true, |id| a.job_id == id))
            .filter(|a| worker_id.map_or(true, |id| a.worker_id == id))
            .cloned()
            .collect())
    }

    async fn complete_job(
        &self,
        job_id: Uuid,
        terms: &SettlementTerms,
    ) -> Result<Settlement, ServiceError> {
        let terms = terms.clone();
        self.transact(move |state| {
            let job = state.set_job_status(job_id, JobStatus::Completed)?;

            let worker_id = state
                .assignments
                .iter()
                .find(|a| a.job_id == job_id)
                .map(|a| a.worker_id);
            let plan = SettlementPlan::new(&job, &terms, worker_id);

            let revenue = AdminRevenue {
                id: Uuid::new_v4(),
                admin_id: terms.admin_id,
                job_id,
                commission_amount: plan.commission.clone(),
                created_at: Utc::now(),
            };
            state.revenue.push(revenue.clone());

            let payout = match &plan.payout {
                Some(posting) => Some(state.post(posting)?),
                None => None,
            };

            if let Some(worker_id) = worker_id {
                state.set_assignment_status(job_id, AssignmentStatus::Completed);
                let worker = state.worker_mut(worker_id)?;
                worker.total_jobs += 1;
            }

            Ok(Settlement {
                job,
                revenue,
                worker_id,
                payout,
            })
        })
        .await
    }

    async fn list_revenue(&self) -> Result<Vec<RevenueReport>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .revenue
            .iter()
            .rev()
            .map(|r| RevenueReport {
                id: r.id,
                job_id: r.job_id,
                job_title: state
                    .jobs
                    .iter()
                    .find(|j| j.id == r.job_id)
                    .map(|j| j.title.clone())
                    .unwrap_or_default(),
                commission_amount: r.commission_amount.clone(),
                created_at: r.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl BiddingExt for MemoryStore {
    async fn place_bid(&self, bid: NewBid) -> Result<Bid, ServiceError> {
        self.transact(|state| {
            let job = state.job_mut(bid.job_id)?;
            ensure_open_for_bids(job)?;
            state.worker_mut(bid.worker_id)?;

            let bid = Bid {
                id: Uuid::new_v4(),
                job_id: bid.job_id,
                worker_id: bid.worker_id,
                bid_amount: bid.bid_amount,
                message: bid.message,
                status: BidStatus::Pending,
                created_at: Utc::now(),
            };
            state.bids.push(bid.clone());
            Ok(bid)
        })
        .await
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.bids.iter().find(|b| b.id == bid_id).cloned())
    }

    async fn list_bids(
        &self,
        job_id: Option<Uuid>,
        worker_id: Option<Uuid>,
    ) -> Result<Vec<Bid>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .bids
            .iter()
            .rev()
            .filter(|b| job_id.map_or(true, |id| b.job_id == id))
            .filter(|b| worker_id.map_or(true, |id| b.worker_id == id))
            .cloned()
            .collect())
    }

    async fn accept_bid(
        &self,
        bid_id: Uuid,
        timing: BidPayoutTiming,
    ) -> Result<BidAcceptance, ServiceError> {
        self.transact(move |state| {
            let bid = state.bid_mut(bid_id)?;
            bid.ensure_pending()?;
            let job_id = bid.job_id;

            ensure_open_for_bids(state.job_mut(job_id)?)?;
            let job = state.set_job_status(job_id, JobStatus::Assigned)?;

            let bid = state.bid_mut(bid_id)?;
            bid.status = BidStatus::Accepted;
            let bid = bid.clone();

            let assignment =
                state.upsert_assignment(job_id, bid.worker_id, AssignedBy::Client(job.client_id));

            let payout = match timing.posting_for(&bid) {
                Some(posting) => Some(state.post(&posting)?),
                None => None,
            };

            Ok(BidAcceptance {
                bid,
                job,
                assignment,
                payout,
            })
        })
        .await
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        self.transact(|state| {
            let bid = state.bid_mut(bid_id)?;
            bid.ensure_pending()?;
            bid.status = BidStatus::Rejected;
            Ok(bid.clone())
        })
        .await
    }
}

#[async_trait]
impl CashoutExt for MemoryStore {
    async fn create_cashout(&self, request: NewCashout) -> Result<CashoutRequest, ServiceError> {
        self.transact(|state| {
            state.worker_mut(request.worker_id)?;

            let request = CashoutRequest {
                id: Uuid::new_v4(),
                worker_id: request.worker_id,
                amount: request.amount,
                bank_name: request.bank_name,
                bank_account: request.bank_account,
                bank_routing: request.bank_routing,
                status: CashoutStatus::Pending,
                admin_notes: None,
                processed_by: None,
                processed_at: None,
                created_at: Utc::now(),
            };
            state.cashouts.push(request.clone());
            Ok(request)
        })
        .await
    }

    async fn get_cashout(&self, cashout_id: Uuid) -> Result<Option<CashoutRequest>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.cashouts.iter().find(|c| c.id == cashout_id).cloned())
    }

    async fn list_cashouts(
        &self,
        worker_id: Option<Uuid>,
        status: Option<CashoutStatus>,
    ) -> Result<Vec<CashoutRequest>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .cashouts
            .iter()
            .rev()
            .filter(|c| worker_id.map_or(true, |id| c.worker_id == id))
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect())
    }

    async fn approve_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<(CashoutRequest, LedgerEntry), ServiceError> {
        self.transact(move |state| {
            let request = state.pending_cashout_mut(cashout_id)?.clone();

            let posting = LedgerPosting::new(
                request.worker_id,
                LedgerMovement::GuardedDebit(request.amount.clone()),
                LedgerReason::Cashout,
            )
            .for_cashout(request.id);
            let entry = state.post(&posting)?;

            let request = state.pending_cashout_mut(cashout_id)?;
            apply_decision(request, CashoutStatus::Approved, decision);
            Ok((request.clone(), entry))
        })
        .await
    }

    async fn reject_cashout(
        &self,
        cashout_id: Uuid,
        decision: CashoutDecision,
    ) -> Result<CashoutRequest, ServiceError> {
        self.transact(move |state| {
            let request = state.pending_cashout_mut(cashout_id)?;
            apply_decision(request, CashoutStatus::Rejected, decision);
            Ok(request.clone())
        })
        .await
    }
}

fn apply_decision(request: &mut CashoutRequest, status: CashoutStatus, decision: CashoutDecision) {
    request.status = status;
    request.processed_by = decision.processed_by;
    if decision.admin_notes.is_some() {
        request.admin_notes = decision.admin_notes;
    }
    request.processed_at = Some(Utc::now());
}
