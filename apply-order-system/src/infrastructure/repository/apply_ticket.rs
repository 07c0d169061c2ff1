use database_model::order::prelude::*;
use domain_apply_order::{
    model::entity::{ApplyTicket, TicketStage},
    repository::ApplyTicketRepo,
};
use infrastructure_architecture::repository::{
    DBRepository, MutableRepository, ReadOnlyRepository,
};
use sea_orm::prelude::*;
use sea_orm::QueryTrait;

use crate::infrastructure::database::{OrmRepo, PendingStatement};

#[async_trait::async_trait]
impl ReadOnlyRepository<ApplyTicket> for OrmRepo {
    async fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<ApplyTicket>> {
        ApplyTicketEntity::find_by_id(*id as i64)
            .one(self.conn())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}

#[async_trait::async_trait]
impl MutableRepository<ApplyTicket> for OrmRepo {
    async fn update(&self, entity: &ApplyTicket) -> anyhow::Result<()> {
        let stmt = ApplyTicketEntity::update(ApplyTicketModel::try_from(entity.to_owned())?.into_set())
            .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(())
    }

    async fn insert(&self, entity: &ApplyTicket) -> anyhow::Result<u64> {
        let stmt = ApplyTicketEntity::insert(ApplyTicketModel::try_from(entity.to_owned())?.into_set())
            .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(entity.order_id)
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.save_changed().await
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard_changed().await
    }
}

impl DBRepository<ApplyTicket> for OrmRepo {}

#[async_trait::async_trait]
impl ApplyTicketRepo for OrmRepo {
    async fn next_order_id(&self) -> anyhow::Result<u64> {
        self.next_val("apply_ticket_order_id_seq").await
    }

    async fn update_with_guard(
        &self,
        entity: &ApplyTicket,
        stages: &[TicketStage],
    ) -> anyhow::Result<()> {
        let stmt = ApplyTicketEntity::update_many()
            .set(ApplyTicketModel::try_from(entity.to_owned())?.into_set())
            .filter(ApplyTicketColumn::OrderId.eq(entity.order_id as i64))
            .filter(ApplyTicketColumn::Stage.is_in(stages.iter().map(|el| *el as i32)))
            .build(self.backend());
        self.push(PendingStatement::Guarded {
            statement: stmt,
            context: format!("ticket {} at {stages:?}", entity.order_id),
        })
        .await;
        Ok(())
    }
}
