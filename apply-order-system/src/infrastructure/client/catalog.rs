use async_trait::async_trait;
use dashmap::DashMap;
use domain_apply_order::{
    model::vo::catalog::DeviceTypeInfo,
    service::{CmdbService, DeviceCatalogService},
};
use serde::Deserialize;

use super::JsonClient;

/// Device catalog, answers are cached for the life of the process.
pub struct HttpDeviceCatalogService {
    pub client: JsonClient,
    pub cache: DashMap<String, DeviceTypeInfo>,
}

impl HttpDeviceCatalogService {
    pub fn new(client: JsonClient) -> Self {
        Self {
            client,
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl DeviceCatalogService for HttpDeviceCatalogService {
    async fn get_device_type_info(&self, device_type: &str) -> anyhow::Result<DeviceTypeInfo> {
        if let Some(info) = self.cache.get(device_type) {
            return Ok(info.clone());
        }
        let info: DeviceTypeInfo =
            self.client.get(&format!("catalog/DeviceType/{device_type}")).await?;
        self.cache.insert(device_type.to_owned(), info.clone());
        Ok(info)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostInfo {
    device_type: String,
}

pub struct HttpCmdbService {
    pub client: JsonClient,
}

#[async_trait]
impl CmdbService for HttpCmdbService {
    async fn get_host_device_type(&self, instance_id: &str) -> anyhow::Result<String> {
        let host: HostInfo = self.client.get(&format!("cmdb/Host/{instance_id}")).await?;
        Ok(host.device_type)
    }
}
