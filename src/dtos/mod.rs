pub mod biddingdtos;
pub mod cashoutdtos;
pub mod jobdtos;
pub mod workerdtos;

use num_traits::Zero;
use sqlx::types::BigDecimal;

use crate::service::ledger::round_money;

/// Amounts are stored in cents, so anything that rounds to zero is rejected.
pub(crate) fn validate_positive_amount(amount: &BigDecimal) -> Result<(), validator::ValidationError> {
    if round_money(amount) > BigDecimal::zero() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("amount must be greater than zero"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sub_cent_amounts_fail_validation() {
        let amount = |s: &str| BigDecimal::from_str(s).unwrap();
        assert!(validate_positive_amount(&amount("0.004")).is_err());
        assert!(validate_positive_amount(&amount("-3")).is_err());
        assert!(validate_positive_amount(&amount("0.005")).is_ok());
        assert!(validate_positive_amount(&amount("250")).is_ok());
    }
}
