use async_trait::async_trait;
use domain_apply_order::{
    model::{entity::ApplyTicket, vo::RequireType},
    service::QuotaService,
};
use serde_json::json;

use super::JsonClient;

pub struct HttpQuotaService {
    pub client: JsonClient,
}

#[async_trait]
impl QuotaService for HttpQuotaService {
    async fn can_apply_host(
        &self,
        biz_id: i64,
        require_type: RequireType,
        replicas: u32,
    ) -> anyhow::Result<bool> {
        self.client
            .query(
                "quota/CanApplyHost",
                &json!({
                    "bizId": biz_id,
                    "requireType": require_type,
                    "replicas": replicas,
                }),
            )
            .await
    }

    async fn create_applied_record(&self, ticket: &ApplyTicket) -> anyhow::Result<()> {
        self.client.post("quota/CreateAppliedRecord", ticket).await
    }

    async fn get_cpu_core_sum(
        &self,
        biz_id: i64,
        require_type: RequireType,
    ) -> anyhow::Result<u64> {
        self.client
            .query(
                "quota/CpuCoreSum",
                &json!({ "bizId": biz_id, "requireType": require_type }),
            )
            .await
    }

    async fn is_res_pool_biz(&self, biz_id: i64) -> anyhow::Result<bool> {
        self.client.get(&format!("quota/ResPoolBiz/{biz_id}")).await
    }
}
