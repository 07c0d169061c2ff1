use chrono::{DateTime, Utc};
use infrastructure_architecture::model::AggregateRoot;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// One generation call issued to CRP for a suborder.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecord {
    pub generate_id: u64,
    pub suborder_id: String,
    /// CRP order id, empty until the call is accepted.
    pub task_id: String,
    pub status: GenerateStatus,
    /// Whether the produced devices were already picked by the matcher.
    pub is_matched: bool,
    pub message: String,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl AggregateRoot for GenerateRecord {
    type Id = u64;
}

#[derive(
    FromPrimitive, ToPrimitive, Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerateStatus {
    #[default]
    Init,
    Handling,
    Success,
    Failed,
}

impl GenerateRecord {
    pub fn is_finished(&self) -> bool {
        matches!(self.status, GenerateStatus::Success | GenerateStatus::Failed)
    }

    pub fn has_task(&self) -> bool {
        !self.task_id.is_empty()
    }
}
