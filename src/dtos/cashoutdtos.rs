use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use super::validate_positive_amount;
use crate::models::cashoutmodel::*;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCashoutDto {
    pub worker_id: Uuid,

    #[validate(custom = "validate_positive_amount")]
    pub amount: BigDecimal,

    #[validate(length(min = 1, max = 255, message = "Bank name is required"))]
    pub bank_name: String,

    #[validate(length(min = 1, max = 64, message = "Bank account is required"))]
    pub bank_account: String,

    #[validate(length(max = 64, message = "Routing number must be at most 64 characters"))]
    pub bank_routing: Option<String>,
}

impl From<CreateCashoutDto> for NewCashout {
    fn from(dto: CreateCashoutDto) -> Self {
        NewCashout {
            worker_id: dto.worker_id,
            amount: dto.amount,
            bank_name: dto.bank_name.trim().to_string(),
            bank_account: dto.bank_account.trim().to_string(),
            bank_routing: dto.bank_routing.filter(|r| !r.trim().is_empty()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CashoutDecisionDto {
    pub admin_id: Option<Uuid>,
    pub admin_notes: Option<String>,
}

impl From<CashoutDecisionDto> for CashoutDecision {
    fn from(dto: CashoutDecisionDto) -> Self {
        CashoutDecision {
            processed_by: dto.admin_id,
            admin_notes: dto.admin_notes,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CashoutQueryDto {
    pub worker_id: Option<Uuid>,
    pub status: Option<CashoutStatus>,
}
