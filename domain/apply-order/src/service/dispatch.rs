use async_trait::async_trait;

use crate::{exception::ApplyOrderResult, model::vo::DispatchOutcome};

#[async_trait]
pub trait DispatchService: Send + Sync {
    /// Run one dispatch cycle for the suborder.
    async fn dispatch(&self, suborder_id: &str) -> ApplyOrderResult<DispatchOutcome>;
}
