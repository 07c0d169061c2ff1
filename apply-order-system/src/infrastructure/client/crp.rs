use async_trait::async_trait;
use domain_apply_order::{model::vo::crp::CrpOrder, service::CrpService};
use serde_json::json;

use super::JsonClient;

pub struct HttpCrpService {
    pub client: JsonClient,
}

#[async_trait]
impl CrpService for HttpCrpService {
    async fn query_orders(&self, task_ids: &[String]) -> anyhow::Result<Vec<CrpOrder>> {
        self.client.query("crp/QueryOrders", &json!({ "taskIds": task_ids })).await
    }

    async fn revoke_order(&self, task_id: &str) -> anyhow::Result<()> {
        self.client.post("crp/RevokeOrder", &json!({ "taskId": task_id })).await
    }
}
