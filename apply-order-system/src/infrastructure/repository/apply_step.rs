use database_model::order::prelude::*;
use domain_apply_order::{
    model::{
        entity::{ApplyStep, StepName},
        vo::{StepFilter, StepUpdate, UpdateOutcome},
    },
    repository::ApplyStepRepo,
};
use infrastructure_architecture::repository::{
    DBRepository, MutableRepository, ReadOnlyRepository,
};
use sea_orm::prelude::*;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{Condition, QueryOrder, QueryTrait, UpdateMany};

use crate::infrastructure::database::{OrmRepo, PendingStatement};

fn condition(filter: &StepFilter) -> Condition {
    let mut cond = Condition::all()
        .add(ApplyStepColumn::SuborderId.eq(filter.suborder_id.as_str()))
        .add(ApplyStepColumn::StepName.eq(filter.step_name as i32));
    if !filter.statuses.is_empty() {
        cond = cond.add(ApplyStepColumn::Status.is_in(filter.statuses.iter().map(|el| *el as i32)));
    }
    cond
}

fn assignments(update: &StepUpdate) -> UpdateMany<ApplyStepEntity> {
    let mut query = ApplyStepEntity::update_many();
    if let Some(status) = update.status {
        query = query.col_expr(ApplyStepColumn::Status, Expr::value(status as i32));
    }
    if let Some(message) = &update.message {
        query = query.col_expr(ApplyStepColumn::Message, Expr::value(message.as_str()));
    }
    if let Some(total_num) = update.total_num {
        query = query.col_expr(ApplyStepColumn::TotalNum, Expr::value(total_num as i32));
    }
    if let Some(success_num) = update.success_num {
        query = query.col_expr(ApplyStepColumn::SuccessNum, Expr::value(success_num as i32));
    }
    if let Some(failed_num) = update.failed_num {
        query = query.col_expr(ApplyStepColumn::FailedNum, Expr::value(failed_num as i32));
    }
    if let Some(running_num) = update.running_num {
        query = query.col_expr(ApplyStepColumn::RunningNum, Expr::value(running_num as i32));
    }
    if let Some(start_at) = update.start_at {
        query = query.col_expr(ApplyStepColumn::StartAt, Expr::value(start_at));
    }
    if let Some(end_at) = update.end_at {
        query = query.col_expr(ApplyStepColumn::EndAt, Expr::value(end_at));
    }
    query
}

#[async_trait::async_trait]
impl ReadOnlyRepository<ApplyStep> for OrmRepo {
    async fn find_by_id(&self, id: &(String, StepName)) -> anyhow::Result<Option<ApplyStep>> {
        ApplyStepEntity::find_by_id((id.0.to_owned(), id.1 as i32))
            .one(self.conn())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}

#[async_trait::async_trait]
impl MutableRepository<ApplyStep> for OrmRepo {
    async fn update(&self, entity: &ApplyStep) -> anyhow::Result<()> {
        let stmt = ApplyStepEntity::update(ApplyStepModel::from(entity.to_owned()).into_set())
            .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(())
    }

    async fn insert(&self, entity: &ApplyStep) -> anyhow::Result<(String, StepName)> {
        let stmt = ApplyStepEntity::insert(ApplyStepModel::from(entity.to_owned()).into_set())
            .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok((entity.suborder_id.clone(), entity.step_name))
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.save_changed().await
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard_changed().await
    }
}

impl DBRepository<ApplyStep> for OrmRepo {}

#[async_trait::async_trait]
impl ApplyStepRepo for OrmRepo {
    async fn get_steps(&self, suborder_id: &str) -> anyhow::Result<Vec<ApplyStep>> {
        let res = ApplyStepEntity::find()
            .filter(ApplyStepColumn::SuborderId.eq(suborder_id))
            .order_by_asc(ApplyStepColumn::StepId)
            .all(self.conn())
            .await?;
        res.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert_if_absent(&self, step: &ApplyStep) -> anyhow::Result<()> {
        let stmt = ApplyStepEntity::insert(ApplyStepModel::from(step.to_owned()).into_set())
            .on_conflict(
                OnConflict::columns([ApplyStepColumn::SuborderId, ApplyStepColumn::StepName])
                    .do_nothing()
                    .to_owned(),
            )
            .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(())
    }

    async fn update_immediately_with_filter(
        &self,
        filter: &StepFilter,
        update: &StepUpdate,
    ) -> anyhow::Result<UpdateOutcome> {
        let res = assignments(update).filter(condition(filter)).exec(self.conn()).await?;
        Ok(UpdateOutcome::from_rows(res.rows_affected))
    }

    async fn update_with_filter(
        &self,
        filter: &StepFilter,
        update: &StepUpdate,
    ) -> anyhow::Result<()> {
        let stmt = assignments(update).filter(condition(filter)).build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(())
    }
}
