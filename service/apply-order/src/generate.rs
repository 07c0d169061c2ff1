use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{entity::ApplyOrder, vo::ResourceType},
    service::{GenerateService, Generator},
};

/// Generators registered per resource type.
#[derive(Default)]
pub struct GenerateServiceImpl {
    generators: HashMap<ResourceType, Arc<dyn Generator>>,
}

impl GenerateServiceImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, resource_type: ResourceType, generator: Arc<dyn Generator>) -> Self {
        self.generators.insert(resource_type, generator);
        self
    }
}

#[async_trait]
impl GenerateService for GenerateServiceImpl {
    async fn generate(&self, order: &ApplyOrder) -> ApplyOrderResult<()> {
        let generator = self.generators.get(&order.resource_type).ok_or(
            ApplyOrderException::UnsupportedResourceType {
                resource_type: order.resource_type.to_string(),
            },
        )?;
        tracing::info!(
            suborder_id = %order.suborder_id,
            resource_type = %order.resource_type,
            "Generate devices."
        );
        generator
            .generate(order)
            .await
            .map_err(|e| ApplyOrderException::external(&format!("generator {}", order.resource_type), e))
    }
}

#[cfg(test)]
mod tests {
    use domain_apply_order::mock::MockGenerator;

    use super::*;

    #[tokio::test]
    async fn routes_by_resource_type() {
        let mut cvm = MockGenerator::new();
        cvm.expect_generate().times(1).returning(|_| Ok(()));
        let mut pm = MockGenerator::new();
        pm.expect_generate().never();
        let service = GenerateServiceImpl::new()
            .register(ResourceType::QCloudCvm, Arc::new(cvm))
            .register(ResourceType::IdcPm, Arc::new(pm));

        let order = ApplyOrder {
            resource_type: ResourceType::QCloudCvm,
            ..Default::default()
        };
        service.generate(&order).await.unwrap();
    }

    #[tokio::test]
    async fn unregistered_type_is_an_error() {
        let service = GenerateServiceImpl::new();
        let order = ApplyOrder {
            resource_type: ResourceType::UpgradeCvm,
            ..Default::default()
        };
        let err = service.generate(&order).await.unwrap_err();
        assert!(matches!(err, ApplyOrderException::UnsupportedResourceType { .. }));
    }

    #[tokio::test]
    async fn generator_failure_is_external() {
        let mut dvm = MockGenerator::new();
        dvm.expect_generate().returning(|_| Err(anyhow::anyhow!("no stock")));
        let service = GenerateServiceImpl::new().register(ResourceType::IdcDvm, Arc::new(dvm));
        let order = ApplyOrder {
            resource_type: ResourceType::IdcDvm,
            ..Default::default()
        };
        let err = service.generate(&order).await.unwrap_err();
        assert!(err.to_string().contains("no stock"));
    }
}
