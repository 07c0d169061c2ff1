use serde::{Deserialize, Serialize};

use super::itsm::{ItsmLog, ItsmNode, ItsmTicketStatus};

/// Whether a ticket can be approved without a human.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuditDecision {
    Auto,
    Manual { reason: String },
}

impl AuditDecision {
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

/// Audit progress of a ticket as seen in ITSM.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    pub order_id: u64,
    pub itsm_ticket_id: String,
    pub status: ItsmTicketStatus,
    pub current_nodes: Vec<ItsmNode>,
    pub logs: Vec<ItsmLog>,
}

/// Result of an approval callback.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ApprovalOutcome {
    #[serde(rename_all = "camelCase")]
    Approved { suborder_ids: Vec<String> },
    Rejected { reason: String },
}
