use chrono::Utc;
use database_model::order::prelude::*;
use domain_apply_order::{model::entity::GenerateRecord, repository::GenerateRecordRepo};
use infrastructure_architecture::repository::ReadOnlyRepository;
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::QueryOrder;

use crate::infrastructure::database::OrmRepo;

#[async_trait::async_trait]
impl ReadOnlyRepository<GenerateRecord> for OrmRepo {
    async fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<GenerateRecord>> {
        GenerateRecordEntity::find_by_id(*id as i64)
            .one(self.conn())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}

#[async_trait::async_trait]
impl GenerateRecordRepo for OrmRepo {
    async fn get_by_suborder_id(&self, suborder_id: &str) -> anyhow::Result<Vec<GenerateRecord>> {
        let res = GenerateRecordEntity::find()
            .filter(GenerateRecordColumn::SuborderId.eq(suborder_id))
            .order_by_asc(GenerateRecordColumn::GenerateId)
            .all(self.conn())
            .await?;
        res.into_iter().map(TryInto::try_into).collect()
    }

    async fn reset_matched_immediately(&self, generate_ids: &[u64]) -> anyhow::Result<u64> {
        let res = GenerateRecordEntity::update_many()
            .col_expr(GenerateRecordColumn::IsMatched, Expr::value(false))
            .col_expr(GenerateRecordColumn::UpdateAt, Expr::value(Utc::now()))
            .filter(GenerateRecordColumn::GenerateId.is_in(generate_ids.iter().map(|el| *el as i64)))
            .exec(self.conn())
            .await?;
        Ok(res.rows_affected)
    }
}
