use database_model::order::prelude::*;
use domain_apply_order::{model::entity::ModifyRecord, repository::ModifyRecordRepo};
use infrastructure_architecture::repository::{
    DBRepository, MutableRepository, ReadOnlyRepository,
};
use sea_orm::prelude::*;
use sea_orm::{QueryOrder, QueryTrait};

use crate::infrastructure::database::{OrmRepo, PendingStatement};

#[async_trait::async_trait]
impl ReadOnlyRepository<ModifyRecord> for OrmRepo {
    async fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<ModifyRecord>> {
        ModifyRecordEntity::find_by_id(*id as i64)
            .one(self.conn())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}

#[async_trait::async_trait]
impl MutableRepository<ModifyRecord> for OrmRepo {
    async fn update(&self, entity: &ModifyRecord) -> anyhow::Result<()> {
        let stmt =
            ModifyRecordEntity::update(ModifyRecordModel::try_from(entity.to_owned())?.into_set())
                .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(())
    }

    async fn insert(&self, entity: &ModifyRecord) -> anyhow::Result<u64> {
        let stmt =
            ModifyRecordEntity::insert(ModifyRecordModel::try_from(entity.to_owned())?.into_set())
                .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(entity.id)
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.save_changed().await
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard_changed().await
    }
}

impl DBRepository<ModifyRecord> for OrmRepo {}

#[async_trait::async_trait]
impl ModifyRecordRepo for OrmRepo {
    async fn next_record_id(&self) -> anyhow::Result<u64> {
        self.next_val("modify_record_id_seq").await
    }

    async fn get_by_suborder_id(&self, suborder_id: &str) -> anyhow::Result<Vec<ModifyRecord>> {
        let res = ModifyRecordEntity::find()
            .filter(ModifyRecordColumn::SuborderId.eq(suborder_id))
            .order_by_asc(ModifyRecordColumn::Id)
            .all(self.conn())
            .await?;
        res.into_iter().map(TryInto::try_into).collect()
    }
}
