use async_trait::async_trait;
use infrastructure_architecture::repository::ReadOnlyRepository;

use crate::model::entity::GenerateRecord;

#[async_trait]
pub trait GenerateRecordRepo: ReadOnlyRepository<GenerateRecord> + Send + Sync {
    async fn get_by_suborder_id(&self, suborder_id: &str) -> anyhow::Result<Vec<GenerateRecord>>;

    /// Hand the devices of these records back to the matcher. Returns the
    /// number of records changed.
    async fn reset_matched_immediately(&self, generate_ids: &[u64]) -> anyhow::Result<u64>;
}
