use async_trait::async_trait;
use infrastructure_architecture::repository::ReadOnlyRepository;
use uuid::Uuid;

use crate::model::entity::DeviceInfo;

#[async_trait]
pub trait DeviceRepo: ReadOnlyRepository<DeviceInfo> + Send + Sync {
    /// Devices bound to the suborder that are not released.
    async fn count_unreleased(&self, suborder_id: &str) -> anyhow::Result<u32>;

    /// Unreleased devices of the suborder not yet delivered.
    async fn get_undelivered(&self, suborder_id: &str) -> anyhow::Result<Vec<DeviceInfo>>;

    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<DeviceInfo>>;
}
