use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Kind of resource a suborder produces.
#[derive(
    FromPrimitive, ToPrimitive, Clone, Copy, Serialize, Deserialize, Debug, Default, Hash, PartialEq, Eq,
)]
pub enum ResourceType {
    /// Cloud virtual machine.
    #[default]
    #[serde(rename = "QCLOUDCVM")]
    QCloudCvm,
    /// Physical machine in an IDC.
    #[serde(rename = "IDCPM")]
    IdcPm,
    /// Dedicated VM hosted on cloud machines.
    #[serde(rename = "QCLOUDDVM")]
    QCloudDvm,
    /// Dedicated VM hosted on IDC machines.
    #[serde(rename = "IDCDVM")]
    IdcDvm,
    /// In-place upgrade of an existing cloud VM.
    #[serde(rename = "UPGRADECVM")]
    UpgradeCvm,
}

impl ResourceType {
    pub fn is_upgrade(&self) -> bool {
        matches!(self, Self::UpgradeCvm)
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, Self::IdcPm)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::QCloudCvm => "QCLOUDCVM",
            Self::IdcPm => "IDCPM",
            Self::QCloudDvm => "QCLOUDDVM",
            Self::IdcDvm => "IDCDVM",
            Self::UpgradeCvm => "UPGRADECVM",
        };
        f.write_str(name)
    }
}

/// Why the requester needs the resources, drives quota accounting.
#[derive(
    FromPrimitive, ToPrimitive, Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq,
)]
#[serde(rename_all = "camelCase")]
pub enum RequireType {
    #[default]
    Regular,
    SpringFestival,
    Dissolve,
    /// Rolling server replacement, inherits the device family of an existing host.
    RollServer,
    /// Small fast-track requests bounded by a core budget.
    GreenChannel,
    ResourcePool,
}

#[derive(
    FromPrimitive, ToPrimitive, Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq,
)]
#[serde(rename_all = "camelCase")]
pub enum ChargeType {
    #[default]
    PostpaidByHour,
    Prepaid,
}

/// Device, placement and network parameters of a requested item.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    pub region: String,
    pub zone: String,
    pub device_type: String,
    pub image_id: String,
    #[serde(default)]
    pub disk_type: String,
    #[serde(default)]
    pub disk_size: u64,
    #[serde(default)]
    pub network_type: String,
    #[serde(default)]
    pub vpc: String,
    #[serde(default)]
    pub subnet: String,
    #[serde(default)]
    pub charge_type: ChargeType,
    #[serde(default)]
    pub charge_months: u32,
    /// Host whose device family a rolling-server request inherits.
    #[serde(default)]
    pub inherit_instance_id: Option<String>,
    /// Zones a previous generation attempt failed in, skipped on retry.
    #[serde(default)]
    pub failed_zone_ids: Vec<String>,
}
