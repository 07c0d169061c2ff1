use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::entity::TicketItem;
use crate::model::vo::{RequireType, ResourceSpec};

/// Draft of a ticket as the requester fills it.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    pub biz_id: i64,
    pub user: String,
    #[serde(default)]
    pub follower: Vec<String>,
    pub require_type: RequireType,
    pub expect_time: DateTime<Utc>,
    #[serde(default)]
    pub remark: String,
    pub suborders: Vec<TicketItem>,
}

/// New replicas and spec of a suspended suborder.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    pub suborder_id: String,
    pub operator: String,
    /// Replicas still to produce.
    pub replicas: u32,
    pub spec: ResourceSpec,
}

/// A manual decision on the current ITSM node of a ticket.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub order_id: u64,
    pub operator: String,
    pub state_id: String,
    pub approval: bool,
    #[serde(default)]
    pub remark: String,
}
