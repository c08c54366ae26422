// service/settlement.rs
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{
        jobmodel::{Bid, Job, JobAssignment, PaymentType},
        revenuemodel::AdminRevenue,
        workermodel::{LedgerEntry, LedgerReason},
    },
    service::{
        error::ServiceError,
        ledger::{round_money, LedgerMovement, LedgerPosting},
    },
};

pub const DEFAULT_COMMISSION_RATE: &str = "15.00";

/// Platform-wide settlement parameters, fixed at startup.
#[derive(Debug, Clone)]
pub struct SettlementTerms {
    /// Percentage, e.g. 15.00 for 15%.
    pub commission_rate: BigDecimal,
    pub admin_id: Uuid,
}

impl Default for SettlementTerms {
    fn default() -> Self {
        Self {
            commission_rate: BigDecimal::from_str(DEFAULT_COMMISSION_RATE)
                .unwrap_or_else(|_| BigDecimal::from(15)),
            admin_id: Uuid::nil(),
        }
    }
}

pub fn commission_for(budget: &BigDecimal, rate_percent: &BigDecimal) -> BigDecimal {
    round_money(&(budget * rate_percent / BigDecimal::from(100)))
}

/// What completing a job does to the books, decided before anything is written.
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    pub commission: BigDecimal,
    pub payout: Option<LedgerPosting>,
}

impl SettlementPlan {
    pub fn new(job: &Job, terms: &SettlementTerms, worker_id: Option<Uuid>) -> Self {
        let commission = commission_for(&job.budget, &terms.commission_rate);

        let payout = worker_id.map(|worker_id| {
            let (movement, reason) = match job.payment_type {
                // The client paid the worker directly; the platform recoups its cut.
                PaymentType::Manual => (
                    LedgerMovement::GuardedDebit(commission.clone()),
                    LedgerReason::SettlementCommission,
                ),
                PaymentType::Online => (
                    LedgerMovement::Credit(round_money(&(&job.budget - &commission))),
                    LedgerReason::SettlementPayout,
                ),
            };
            LedgerPosting::new(worker_id, movement, reason).for_job(job.id)
        });

        Self { commission, payout }
    }
}

/// When an accepted bid pays the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BidPayoutTiming {
    /// Nothing moves on acceptance; the job settles on completion.
    #[default]
    OnCompletion,
    /// The bid amount is credited as soon as the bid is accepted.
    Immediate,
}

impl FromStr for BidPayoutTiming {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_completion" => Ok(BidPayoutTiming::OnCompletion),
            "immediate" => Ok(BidPayoutTiming::Immediate),
            other => Err(ServiceError::Validation(format!(
                "Unknown bid payout timing '{}'",
                other
            ))),
        }
    }
}

impl BidPayoutTiming {
    pub fn posting_for(&self, bid: &Bid) -> Option<LedgerPosting> {
        match self {
            BidPayoutTiming::OnCompletion => None,
            BidPayoutTiming::Immediate => Some(
                LedgerPosting::new(
                    bid.worker_id,
                    LedgerMovement::Credit(bid.bid_amount.clone()),
                    LedgerReason::BidAcceptance,
                )
                .for_job(bid.job_id),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BidAcceptance {
    pub bid: Bid,
    pub job: Job,
    pub assignment: JobAssignment,
    pub payout: Option<LedgerEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub job: Job,
    pub revenue: AdminRevenue,
    pub worker_id: Option<Uuid>,
    pub payout: Option<LedgerEntry>,
}
