use async_trait::async_trait;
use domain_apply_order::{
    model::entity::{ApplyOrder, DeviceInfo},
    service::MatcherService,
};
use serde_json::json;
use uuid::Uuid;

use super::JsonClient;

pub struct HttpMatcherService {
    pub client: JsonClient,
}

#[async_trait]
impl MatcherService for HttpMatcherService {
    async fn run_disk_check(&self, order: &ApplyOrder) -> anyhow::Result<()> {
        self.client.post("matcher/DiskCheck", order).await
    }

    async fn process_init_step(
        &self,
        order: &ApplyOrder,
        devices: &[DeviceInfo],
    ) -> anyhow::Result<()> {
        self.client
            .post("matcher/InitStep", &json!({ "order": order, "devices": devices }))
            .await
    }

    async fn deliver_devices(
        &self,
        order: &ApplyOrder,
        devices: &[DeviceInfo],
    ) -> anyhow::Result<()> {
        self.client
            .post("matcher/Deliver", &json!({ "order": order, "devices": devices }))
            .await
    }

    async fn set_device_delivered(&self, device_ids: &[Uuid]) -> anyhow::Result<()> {
        self.client
            .post("matcher/SetDelivered", &json!({ "deviceIds": device_ids }))
            .await
    }

    async fn final_apply_step(&self, order: &ApplyOrder) -> anyhow::Result<()> {
        self.client.post("matcher/FinalApplyStep", order).await
    }
}
