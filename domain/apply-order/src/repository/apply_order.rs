use async_trait::async_trait;
use infrastructure_architecture::repository::DBRepository;

use crate::model::{
    entity::ApplyOrder,
    vo::{OrderFilter, OrderUpdate, UpdateOutcome},
};

#[async_trait]
pub trait ApplyOrderRepo: DBRepository<ApplyOrder> + Send + Sync {
    /// Suborders of a ticket, ordered by suborder id.
    async fn get_by_order_id(&self, order_id: u64) -> anyhow::Result<Vec<ApplyOrder>>;

    /// Suborders with the given ids, missing ids are skipped.
    async fn get_by_suborder_ids(&self, suborder_ids: &[String])
        -> anyhow::Result<Vec<ApplyOrder>>;

    /// Ids of running suborders a dispatcher may pick up, oldest update first.
    async fn get_dispatchable_ids(&self, limit: u64) -> anyhow::Result<Vec<String>>;

    /// Single-row conditional update executed at once.
    async fn update_immediately_with_filter(
        &self,
        filter: &OrderFilter,
        update: &OrderUpdate,
    ) -> anyhow::Result<UpdateOutcome>;

    /// Buffered conditional update. Committing fails if it matches no row.
    async fn update_with_filter(
        &self,
        filter: &OrderFilter,
        update: &OrderUpdate,
    ) -> anyhow::Result<()>;
}
