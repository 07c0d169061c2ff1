use async_trait::async_trait;

use crate::model::vo::itsm::{ItsmCreateRequest, ItsmLog, ItsmOperateRequest, ItsmStatus};

#[async_trait]
pub trait ItsmService: Send + Sync {
    /// Returns the ITSM ticket id.
    async fn create_ticket(&self, request: &ItsmCreateRequest) -> anyhow::Result<String>;

    async fn terminate_ticket(
        &self,
        itsm_ticket_id: &str,
        operator: &str,
        reason: &str,
    ) -> anyhow::Result<()>;

    async fn operate_node(&self, request: &ItsmOperateRequest) -> anyhow::Result<()>;

    async fn get_ticket_status(&self, itsm_ticket_id: &str) -> anyhow::Result<ItsmStatus>;

    async fn get_ticket_log(&self, itsm_ticket_id: &str) -> anyhow::Result<Vec<ItsmLog>>;
}
