// service/retry.rs
use std::future::Future;

use tokio::time::{sleep, Duration};

use crate::service::error::ServiceError;

pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 25;

/// Runs `op` until it succeeds, fails with a non-transient error, or has been
/// attempted `max_retries + 1` times. Only serialization conflicts are retried.
pub async fn with_conflict_retry<T, F, Fut>(
    op_name: &str,
    max_retries: u32,
    mut op: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                tracing::warn!(
                    "{} hit a concurrent update conflict (attempt {}). Retrying in {}ms: {}",
                    op_name,
                    attempt,
                    delay,
                    e
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!("{} gave up after {} retries: {}", op_name, attempt, e);
                }
                return Err(e);
            }
            Ok(value) => return Ok(value),
        }
    }
}
