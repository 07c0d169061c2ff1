use async_trait::async_trait;
use domain_apply_order::{model::entity::ApplyOrder, service::Generator};

use super::JsonClient;

/// Remote producer of one resource type.
pub struct HttpGenerator {
    pub client: JsonClient,
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, order: &ApplyOrder) -> anyhow::Result<()> {
        self.client.post("Generate", order).await
    }
}
