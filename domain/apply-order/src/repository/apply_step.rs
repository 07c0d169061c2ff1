use async_trait::async_trait;
use infrastructure_architecture::repository::DBRepository;

use crate::model::{
    entity::ApplyStep,
    vo::{StepFilter, StepUpdate, UpdateOutcome},
};

#[async_trait]
pub trait ApplyStepRepo: DBRepository<ApplyStep> + Send + Sync {
    /// Steps of a suborder in ordinal order.
    async fn get_steps(&self, suborder_id: &str) -> anyhow::Result<Vec<ApplyStep>>;

    /// Buffer an insert that is ignored when the step already exists.
    async fn insert_if_absent(&self, step: &ApplyStep) -> anyhow::Result<()>;

    async fn update_immediately_with_filter(
        &self,
        filter: &StepFilter,
        update: &StepUpdate,
    ) -> anyhow::Result<UpdateOutcome>;

    /// Buffered update, matching no row is not an error.
    async fn update_with_filter(&self, filter: &StepFilter, update: &StepUpdate)
        -> anyhow::Result<()>;
}
