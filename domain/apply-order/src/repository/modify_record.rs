use async_trait::async_trait;
use infrastructure_architecture::repository::DBRepository;

use crate::model::entity::ModifyRecord;

#[async_trait]
pub trait ModifyRecordRepo: DBRepository<ModifyRecord> + Send + Sync {
    async fn next_record_id(&self) -> anyhow::Result<u64>;

    /// Records of a suborder, oldest first.
    async fn get_by_suborder_id(&self, suborder_id: &str) -> anyhow::Result<Vec<ModifyRecord>>;
}
