use async_trait::async_trait;
use uuid::Uuid;

use crate::model::entity::{ApplyOrder, DeviceInfo};

/// Matching, disk check and delivery of produced devices.
#[async_trait]
pub trait MatcherService: Send + Sync {
    async fn run_disk_check(&self, order: &ApplyOrder) -> anyhow::Result<()>;

    async fn process_init_step(
        &self,
        order: &ApplyOrder,
        devices: &[DeviceInfo],
    ) -> anyhow::Result<()>;

    async fn deliver_devices(&self, order: &ApplyOrder, devices: &[DeviceInfo])
        -> anyhow::Result<()>;

    async fn set_device_delivered(&self, device_ids: &[Uuid]) -> anyhow::Result<()>;

    /// Called once the suborder has everything it asked for.
    async fn final_apply_step(&self, order: &ApplyOrder) -> anyhow::Result<()>;
}
