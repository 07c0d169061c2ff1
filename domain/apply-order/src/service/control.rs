use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    exception::ApplyOrderResult,
    model::{
        entity::{ApplyOrder, ApplyStep, ModifyRecord},
        vo::{request::ModifyRequest, RecoverHandle},
    },
};

#[async_trait]
pub trait OrderControlService: Send + Sync {
    /// Resume suspended suborders. All or nothing.
    async fn start(&self, suborder_ids: &[String]) -> ApplyOrderResult<Vec<RecoverHandle>>;

    async fn pause(&self, suborder_ids: &[String]) -> ApplyOrderResult<()>;

    /// Terminate suspended suborders. All or nothing.
    async fn terminate(&self, suborder_ids: &[String]) -> ApplyOrderResult<()>;

    async fn modify(&self, request: ModifyRequest) -> ApplyOrderResult<RecoverHandle>;

    /// Gracefully terminate a producing suborder and revoke its CRP tasks.
    async fn cancel_crp(&self, suborder_id: &str) -> ApplyOrderResult<()>;

    async fn deliver_devices(
        &self,
        suborder_id: &str,
        device_ids: &[Uuid],
    ) -> ApplyOrderResult<ApplyOrder>;

    async fn run_disk_check(&self, suborder_id: &str) -> ApplyOrderResult<()>;

    async fn get_suborders(&self, order_id: u64) -> ApplyOrderResult<Vec<ApplyOrder>>;

    async fn get_steps(&self, suborder_id: &str) -> ApplyOrderResult<Vec<ApplyStep>>;

    async fn get_modify_records(&self, suborder_id: &str) -> ApplyOrderResult<Vec<ModifyRecord>>;
}
