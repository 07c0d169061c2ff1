use async_trait::async_trait;

use crate::{exception::ApplyOrderResult, model::vo::RetryOutcome};

#[async_trait]
pub trait RecoverService: Send + Sync {
    /// Wait for a restarted suborder to be picked up, then hand its
    /// undelivered devices back to the matcher.
    async fn retry_failed_devices(&self, suborder_id: &str) -> ApplyOrderResult<RetryOutcome>;
}
