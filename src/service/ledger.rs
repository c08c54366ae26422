// service/ledger.rs
use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::Zero;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::workermodel::{LedgerDirection, LedgerReason},
    service::error::ServiceError,
};

/// Money is kept at two decimal places; everything the service computes is
/// rounded half-up before it touches a balance.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// Rounds an incoming amount to cents and rejects it unless the rounded
/// value is still above zero.
pub fn positive_money(field: &str, amount: &BigDecimal) -> Result<BigDecimal, ServiceError> {
    let amount = round_money(amount);
    if amount <= BigDecimal::zero() {
        return Err(ServiceError::Validation(format!("{} must be greater than zero", field)));
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum LedgerMovement {
    Credit(BigDecimal),
    /// Unguarded; the caller has already decided the balance may absorb it.
    Debit(BigDecimal),
    GuardedDebit(BigDecimal),
}

impl LedgerMovement {
    pub fn amount(&self) -> &BigDecimal {
        match self {
            LedgerMovement::Credit(amount)
            | LedgerMovement::Debit(amount)
            | LedgerMovement::GuardedDebit(amount) => amount,
        }
    }

    pub fn direction(&self) -> LedgerDirection {
        match self {
            LedgerMovement::Credit(_) => LedgerDirection::Credit,
            LedgerMovement::Debit(_) | LedgerMovement::GuardedDebit(_) => LedgerDirection::Debit,
        }
    }

    /// Computes the balance after this movement.
    pub fn apply(&self, balance: &BigDecimal) -> Result<BigDecimal, ServiceError> {
        match self {
            LedgerMovement::Credit(amount) => Ok(round_money(&(balance + amount))),
            LedgerMovement::Debit(amount) => Ok(round_money(&(balance - amount))),
            LedgerMovement::GuardedDebit(amount) => {
                if balance < amount {
                    return Err(ServiceError::InsufficientBalance {
                        required: amount.clone(),
                        available: balance.clone(),
                    });
                }
                Ok(round_money(&(balance - amount)))
            }
        }
    }
}

/// A movement against one worker's balance together with what caused it.
#[derive(Debug, Clone)]
pub struct LedgerPosting {
    pub worker_id: Uuid,
    pub movement: LedgerMovement,
    pub reason: LedgerReason,
    pub job_id: Option<Uuid>,
    pub cashout_id: Option<Uuid>,
}

impl LedgerPosting {
    pub fn new(worker_id: Uuid, movement: LedgerMovement, reason: LedgerReason) -> Self {
        Self {
            worker_id,
            movement,
            reason,
            job_id: None,
            cashout_id: None,
        }
    }

    pub fn for_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn for_cashout(mut self, cashout_id: Uuid) -> Self {
        self.cashout_id = Some(cashout_id);
        self
    }
}
