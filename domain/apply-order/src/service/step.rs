use async_trait::async_trait;

use crate::{
    exception::ApplyOrderResult,
    model::{
        entity::{ApplyOrder, ApplyStep, StepName},
        vo::UpdateOutcome,
    },
};

/// Per-suborder progress ledger.
#[async_trait]
pub trait ApplyStepService: Send + Sync {
    /// Buffer the ledger of a new suborder. Steps that already exist are kept.
    async fn init_steps(&self, order: &ApplyOrder) -> ApplyOrderResult<()>;

    /// Move a step from `Init` to `Handling`. Steps past `Init` are left alone.
    async fn start_step(&self, suborder_id: &str, step: StepName)
        -> ApplyOrderResult<UpdateOutcome>;

    /// Record progress, the step succeeds once `success_num` reaches `total_num`.
    /// Returns whether it did.
    async fn update_progress(
        &self,
        suborder_id: &str,
        step: StepName,
        success_num: u32,
        total_num: u32,
    ) -> ApplyOrderResult<bool>;

    async fn fail_step(&self, suborder_id: &str, step: StepName, message: &str)
        -> ApplyOrderResult<()>;

    /// Buffer `Failed -> Handling` for every failed step of the suborder.
    async fn restart_failed_steps(&self, suborder_id: &str) -> ApplyOrderResult<()>;

    async fn get_steps(&self, suborder_id: &str) -> ApplyOrderResult<Vec<ApplyStep>>;
}
