use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use super::validate_positive_amount;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateWorkerDto {
    pub user_id: Uuid,
}

/// Admin credit applied to a worker balance.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct BalanceAdjustmentDto {
    #[validate(custom = "validate_positive_amount")]
    pub amount: BigDecimal,
}
