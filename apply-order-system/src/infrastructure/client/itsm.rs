use async_trait::async_trait;
use domain_apply_order::{
    model::vo::itsm::{ItsmCreateRequest, ItsmLog, ItsmOperateRequest, ItsmStatus},
    service::ItsmService,
};
use serde_json::json;

use super::JsonClient;

pub struct HttpItsmService {
    pub client: JsonClient,
}

#[async_trait]
impl ItsmService for HttpItsmService {
    async fn create_ticket(&self, request: &ItsmCreateRequest) -> anyhow::Result<String> {
        self.client.post("itsm/CreateTicket", request).await
    }

    async fn terminate_ticket(
        &self,
        itsm_ticket_id: &str,
        operator: &str,
        reason: &str,
    ) -> anyhow::Result<()> {
        self.client
            .post(
                "itsm/TerminateTicket",
                &json!({
                    "itsmTicketId": itsm_ticket_id,
                    "operator": operator,
                    "reason": reason,
                }),
            )
            .await
    }

    async fn operate_node(&self, request: &ItsmOperateRequest) -> anyhow::Result<()> {
        self.client.post("itsm/OperateNode", request).await
    }

    async fn get_ticket_status(&self, itsm_ticket_id: &str) -> anyhow::Result<ItsmStatus> {
        self.client.get(&format!("itsm/TicketStatus/{itsm_ticket_id}")).await
    }

    async fn get_ticket_log(&self, itsm_ticket_id: &str) -> anyhow::Result<Vec<ItsmLog>> {
        self.client.get(&format!("itsm/TicketLog/{itsm_ticket_id}")).await
    }
}
