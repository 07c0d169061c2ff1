use chrono::{DateTime, Utc};
use infrastructure_architecture::model::AggregateRoot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A device produced for a suborder.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub id: Uuid,
    pub order_id: u64,
    pub suborder_id: String,
    /// Generation call that produced the device.
    pub generate_id: u64,
    pub asset_id: String,
    pub ip: String,
    pub device_type: String,
    pub zone: String,
    pub is_delivered: bool,
    pub is_released: bool,
    pub create_at: DateTime<Utc>,
}

impl AggregateRoot for DeviceInfo {
    type Id = Uuid;
}
