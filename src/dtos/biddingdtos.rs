use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use super::validate_positive_amount;
use crate::models::jobmodel::NewBid;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PlaceBidDto {
    pub job_id: Uuid,
    pub worker_id: Uuid,

    #[validate(custom = "validate_positive_amount")]
    pub bid_amount: BigDecimal,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,
}

impl From<PlaceBidDto> for NewBid {
    fn from(dto: PlaceBidDto) -> Self {
        NewBid {
            job_id: dto.job_id,
            worker_id: dto.worker_id,
            bid_amount: dto.bid_amount,
            message: dto.message.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BidQueryDto {
    pub job_id: Option<Uuid>,
    pub worker_id: Option<Uuid>,
}
