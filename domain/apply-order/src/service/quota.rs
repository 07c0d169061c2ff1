use async_trait::async_trait;

use crate::model::{entity::ApplyTicket, vo::RequireType};

#[async_trait]
pub trait QuotaService: Send + Sync {
    async fn can_apply_host(
        &self,
        biz_id: i64,
        require_type: RequireType,
        replicas: u32,
    ) -> anyhow::Result<bool>;

    async fn create_applied_record(&self, ticket: &ApplyTicket) -> anyhow::Result<()>;

    /// Cpu cores already applied by the business under `require_type`.
    async fn get_cpu_core_sum(&self, biz_id: i64, require_type: RequireType)
        -> anyhow::Result<u64>;

    async fn is_res_pool_biz(&self, biz_id: i64) -> anyhow::Result<bool>;
}
