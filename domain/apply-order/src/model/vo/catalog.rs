use serde::{Deserialize, Serialize};

/// Catalog facts about a device type.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTypeInfo {
    pub device_type: String,
    pub device_group: String,
    /// Core-size class, e.g. small/medium/large.
    pub core_size: String,
    pub cpu_core: u64,
    pub is_gpu: bool,
}
