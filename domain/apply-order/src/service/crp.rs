use async_trait::async_trait;

use crate::model::vo::crp::CrpOrder;

#[async_trait]
pub trait CrpService: Send + Sync {
    async fn query_orders(&self, task_ids: &[String]) -> anyhow::Result<Vec<CrpOrder>>;

    async fn revoke_order(&self, task_id: &str) -> anyhow::Result<()>;
}
