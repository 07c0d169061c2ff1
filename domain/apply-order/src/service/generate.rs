use async_trait::async_trait;

use crate::{exception::ApplyOrderResult, model::entity::ApplyOrder};

/// Produces devices of one resource type.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, order: &ApplyOrder) -> anyhow::Result<()>;
}

/// Routes a suborder to the generator of its resource type.
#[async_trait]
pub trait GenerateService: Send + Sync {
    async fn generate(&self, order: &ApplyOrder) -> ApplyOrderResult<()>;
}
