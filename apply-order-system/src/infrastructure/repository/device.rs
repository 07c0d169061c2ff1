use database_model::order::prelude::*;
use domain_apply_order::{model::entity::DeviceInfo, repository::DeviceRepo};
use infrastructure_architecture::repository::ReadOnlyRepository;
use sea_orm::prelude::*;
use sea_orm::PaginatorTrait;

use crate::infrastructure::database::OrmRepo;

#[async_trait::async_trait]
impl ReadOnlyRepository<DeviceInfo> for OrmRepo {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<DeviceInfo>> {
        Ok(DeviceInfoEntity::find_by_id(*id).one(self.conn()).await?.map(Into::into))
    }
}

#[async_trait::async_trait]
impl DeviceRepo for OrmRepo {
    async fn count_unreleased(&self, suborder_id: &str) -> anyhow::Result<u32> {
        let count = DeviceInfoEntity::find()
            .filter(DeviceInfoColumn::SuborderId.eq(suborder_id))
            .filter(DeviceInfoColumn::IsReleased.eq(false))
            .count(self.conn())
            .await?;
        Ok(count as u32)
    }

    async fn get_undelivered(&self, suborder_id: &str) -> anyhow::Result<Vec<DeviceInfo>> {
        let res = DeviceInfoEntity::find()
            .filter(DeviceInfoColumn::SuborderId.eq(suborder_id))
            .filter(DeviceInfoColumn::IsReleased.eq(false))
            .filter(DeviceInfoColumn::IsDelivered.eq(false))
            .all(self.conn())
            .await?;
        Ok(res.into_iter().map(Into::into).collect())
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<DeviceInfo>> {
        let res = DeviceInfoEntity::find()
            .filter(DeviceInfoColumn::Id.is_in(ids.iter().copied()))
            .all(self.conn())
            .await?;
        Ok(res.into_iter().map(Into::into).collect())
    }
}
