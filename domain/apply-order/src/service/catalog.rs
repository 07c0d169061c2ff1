use async_trait::async_trait;

use crate::model::vo::catalog::DeviceTypeInfo;

#[async_trait]
pub trait DeviceCatalogService: Send + Sync {
    async fn get_device_type_info(&self, device_type: &str) -> anyhow::Result<DeviceTypeInfo>;
}

#[async_trait]
pub trait CmdbService: Send + Sync {
    /// Device type of an existing host.
    async fn get_host_device_type(&self, instance_id: &str) -> anyhow::Result<String>;
}
