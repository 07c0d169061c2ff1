use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItsmTicketStatus {
    #[default]
    Running,
    Suspended,
    Finished,
    Terminated,
    Revoked,
}

impl ItsmTicketStatus {
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Running | Self::Suspended)
    }
}

/// An approval node the ticket currently waits on.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItsmNode {
    pub state_id: String,
    pub name: String,
    #[serde(default)]
    pub processors: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItsmStatus {
    pub status: ItsmTicketStatus,
    #[serde(default)]
    pub current_nodes: Vec<ItsmNode>,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItsmLog {
    pub operator: String,
    pub message: String,
    pub operate_at: DateTime<Utc>,
}

/// Ticket opened in ITSM on submission.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItsmCreateRequest {
    pub order_id: u64,
    pub creator: String,
    pub biz_id: i64,
    /// Empty when the ticket can be approved automatically.
    pub manual_audit_reason: String,
    pub remark: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItsmOperateRequest {
    pub itsm_ticket_id: String,
    pub state_id: String,
    pub operator: String,
    pub approval: bool,
    pub remark: String,
}
