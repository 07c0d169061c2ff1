use chrono::Utc;
use database_model::order::prelude::*;
use domain_apply_order::{
    model::{
        entity::{ApplyOrder, ApplyStatus, TicketStage},
        vo::{CounterUpdate, OrderFilter, OrderUpdate, UpdateOutcome},
    },
    repository::ApplyOrderRepo,
};
use infrastructure_architecture::repository::{
    DBRepository, MutableRepository, ReadOnlyRepository,
};
use sea_orm::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{Condition, QueryOrder, QuerySelect, QueryTrait, UpdateMany};

use crate::infrastructure::database::{OrmRepo, PendingStatement};

/// Statuses a dispatcher never picks up.
const NOT_DISPATCHABLE: [ApplyStatus; 4] = [
    ApplyStatus::Matching,
    ApplyStatus::Done,
    ApplyStatus::Terminate,
    ApplyStatus::GracefulTerminate,
];

fn condition(filter: &OrderFilter) -> Condition {
    let mut cond =
        Condition::all().add(ApplyOrderColumn::SuborderId.eq(filter.suborder_id.as_str()));
    if !filter.stages.is_empty() {
        cond = cond.add(ApplyOrderColumn::Stage.is_in(filter.stages.iter().map(|el| *el as i32)));
    }
    if !filter.statuses.is_empty() {
        cond = cond
            .add(ApplyOrderColumn::Status.is_in(filter.statuses.iter().map(|el| *el as i32)));
    }
    if !filter.excluded_statuses.is_empty() {
        cond = cond.add(
            ApplyOrderColumn::Status.is_not_in(filter.excluded_statuses.iter().map(|el| *el as i32)),
        );
    }
    if let Some(max) = filter.max_retry_time {
        cond = cond.add(ApplyOrderColumn::RetryTime.lte(max as i32));
    }
    if let Some(success_num) = filter.success_num {
        cond = cond.add(ApplyOrderColumn::SuccessNum.eq(success_num as i32));
    }
    cond
}

fn counter(column: ApplyOrderColumn, update: CounterUpdate) -> SimpleExpr {
    match update {
        CounterUpdate::Set(v) => Expr::value(v as i32),
        CounterUpdate::Increment => Expr::col(column).add(1),
    }
}

/// Column assignments of a targeted update, `update_at` always included.
fn assignments(update: &OrderUpdate) -> anyhow::Result<UpdateMany<ApplyOrderEntity>> {
    let mut query =
        ApplyOrderEntity::update_many().col_expr(ApplyOrderColumn::UpdateAt, Expr::value(Utc::now()));
    if let Some(stage) = update.stage {
        query = query.col_expr(ApplyOrderColumn::Stage, Expr::value(stage as i32));
    }
    if let Some(status) = update.status {
        query = query.col_expr(ApplyOrderColumn::Status, Expr::value(status as i32));
    }
    if let Some(retry_time) = update.retry_time {
        query = query.col_expr(
            ApplyOrderColumn::RetryTime,
            counter(ApplyOrderColumn::RetryTime, retry_time),
        );
    }
    if let Some(modify_time) = update.modify_time {
        query = query.col_expr(
            ApplyOrderColumn::ModifyTime,
            counter(ApplyOrderColumn::ModifyTime, modify_time),
        );
    }
    if let Some(total_num) = update.total_num {
        query = query.col_expr(ApplyOrderColumn::TotalNum, Expr::value(total_num as i32));
    }
    if let Some(pending_num) = update.pending_num {
        query = query.col_expr(ApplyOrderColumn::PendingNum, Expr::value(pending_num as i32));
    }
    if let Some(success_num) = update.success_num {
        query = query.col_expr(ApplyOrderColumn::SuccessNum, Expr::value(success_num as i32));
    }
    if let Some(delivered_core) = update.delivered_core {
        query = query.col_expr(
            ApplyOrderColumn::DeliveredCore,
            Expr::value(delivered_core as i64),
        );
    }
    if let Some(spec) = &update.spec {
        query = query.col_expr(ApplyOrderColumn::Spec, Expr::value(serde_json::to_value(spec)?));
    }
    Ok(query)
}

fn into_orders(models: Vec<ApplyOrderModel>) -> anyhow::Result<Vec<ApplyOrder>> {
    models.into_iter().map(TryInto::try_into).collect()
}

#[async_trait::async_trait]
impl ReadOnlyRepository<ApplyOrder> for OrmRepo {
    async fn find_by_id(&self, id: &String) -> anyhow::Result<Option<ApplyOrder>> {
        ApplyOrderEntity::find_by_id(id.to_owned())
            .one(self.conn())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}

#[async_trait::async_trait]
impl MutableRepository<ApplyOrder> for OrmRepo {
    async fn update(&self, entity: &ApplyOrder) -> anyhow::Result<()> {
        let stmt = ApplyOrderEntity::update(ApplyOrderModel::try_from(entity.to_owned())?.into_set())
            .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(())
    }

    async fn insert(&self, entity: &ApplyOrder) -> anyhow::Result<String> {
        let stmt = ApplyOrderEntity::insert(ApplyOrderModel::try_from(entity.to_owned())?.into_set())
            .build(self.backend());
        self.push(PendingStatement::Plain(stmt)).await;
        Ok(entity.suborder_id.clone())
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.save_changed().await
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard_changed().await
    }
}

impl DBRepository<ApplyOrder> for OrmRepo {}

#[async_trait::async_trait]
impl ApplyOrderRepo for OrmRepo {
    async fn get_by_order_id(&self, order_id: u64) -> anyhow::Result<Vec<ApplyOrder>> {
        let res = ApplyOrderEntity::find()
            .filter(ApplyOrderColumn::OrderId.eq(order_id as i64))
            .order_by_asc(ApplyOrderColumn::SuborderId)
            .all(self.conn())
            .await?;
        into_orders(res)
    }

    async fn get_by_suborder_ids(
        &self,
        suborder_ids: &[String],
    ) -> anyhow::Result<Vec<ApplyOrder>> {
        let res = ApplyOrderEntity::find()
            .filter(ApplyOrderColumn::SuborderId.is_in(suborder_ids.iter().cloned()))
            .all(self.conn())
            .await?;
        let mut orders = into_orders(res)?;
        orders.sort_by_key(|el| suborder_ids.iter().position(|id| id == &el.suborder_id));
        Ok(orders)
    }

    async fn get_dispatchable_ids(&self, limit: u64) -> anyhow::Result<Vec<String>> {
        let ids = ApplyOrderEntity::find()
            .select_only()
            .column(ApplyOrderColumn::SuborderId)
            .filter(ApplyOrderColumn::Stage.eq(TicketStage::Running as i32))
            .filter(ApplyOrderColumn::Status.is_not_in(NOT_DISPATCHABLE.iter().map(|el| *el as i32)))
            .order_by_asc(ApplyOrderColumn::UpdateAt)
            .limit(limit)
            .into_tuple::<String>()
            .all(self.conn())
            .await?;
        Ok(ids)
    }

    async fn update_immediately_with_filter(
        &self,
        filter: &OrderFilter,
        update: &OrderUpdate,
    ) -> anyhow::Result<UpdateOutcome> {
        let res = assignments(update)?.filter(condition(filter)).exec(self.conn()).await?;
        Ok(UpdateOutcome::from_rows(res.rows_affected))
    }

    async fn update_with_filter(
        &self,
        filter: &OrderFilter,
        update: &OrderUpdate,
    ) -> anyhow::Result<()> {
        let stmt = assignments(update)?.filter(condition(filter)).build(self.backend());
        self.push(PendingStatement::Guarded {
            statement: stmt,
            context: format!("{filter:?}"),
        })
        .await;
        Ok(())
    }
}
