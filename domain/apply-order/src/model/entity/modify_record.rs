use chrono::{DateTime, Utc};
use infrastructure_architecture::model::AggregateRoot;
use serde::{Deserialize, Serialize};

use crate::model::vo::ResourceSpec;

/// Immutable audit entry of one suborder modification.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRecord {
    pub id: u64,
    pub order_id: u64,
    pub suborder_id: String,
    pub operator: String,
    pub pre_data: ModifySnapshot,
    pub cur_data: ModifySnapshot,
    pub create_at: DateTime<Utc>,
}

impl AggregateRoot for ModifyRecord {
    type Id = u64;
}

/// Spec and counts of a suborder at one point in time.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModifySnapshot {
    pub total_num: u32,
    pub pending_num: u32,
    pub success_num: u32,
    pub spec: ResourceSpec,
}
