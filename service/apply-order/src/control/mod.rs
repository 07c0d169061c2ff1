mod cancel;
mod deliver;
mod modify;

use std::sync::Arc;

use async_trait::async_trait;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::{ApplyOrder, ApplyStatus, ApplyStep, ModifyRecord, TicketStage},
        vo::{request::ModifyRequest, CounterUpdate, OrderFilter, OrderUpdate, RecoverHandle},
    },
    repository::{
        ApplyOrderRepo, ApplyTicketRepo, DeviceRepo, GenerateRecordRepo, ModifyRecordRepo,
    },
    service::{
        ApplyStepService, CrpService, DeviceCatalogService, InformerService, MatcherService,
        OrderControlService, RecoverService,
    },
};
use uuid::Uuid;

use crate::recover::spawn_recover;

#[derive(typed_builder::TypedBuilder)]
pub struct OrderControlServiceImpl {
    order_repo: Arc<dyn ApplyOrderRepo>,
    ticket_repo: Arc<dyn ApplyTicketRepo>,
    modify_record_repo: Arc<dyn ModifyRecordRepo>,
    device_repo: Arc<dyn DeviceRepo>,
    generate_record_repo: Arc<dyn GenerateRecordRepo>,
    step_service: Arc<dyn ApplyStepService>,
    recover_service: Arc<dyn RecoverService>,
    informer: Arc<dyn InformerService>,
    catalog: Arc<dyn DeviceCatalogService>,
    crp: Arc<dyn CrpService>,
    matcher: Arc<dyn MatcherService>,
}

#[async_trait]
impl OrderControlService for OrderControlServiceImpl {
    async fn start(&self, suborder_ids: &[String]) -> ApplyOrderResult<Vec<RecoverHandle>> {
        let orders = self.load_all(suborder_ids).await?;
        for order in orders.iter() {
            order.ensure_stage(&[TicketStage::Suspend])?;
        }
        let res = async {
            for order in orders.iter() {
                self.step_service.restart_failed_steps(&order.suborder_id).await?;
                self.order_repo
                    .update_with_filter(
                        &OrderFilter::by_id(&order.suborder_id).with_stages(&[TicketStage::Suspend]),
                        &OrderUpdate {
                            retry_time: Some(CounterUpdate::Set(0)),
                            ..OrderUpdate::stage_status(TicketStage::Running, ApplyStatus::WaitForMatch)
                        },
                    )
                    .await?;
            }
            self.order_repo.save_changed().await?;
            ApplyOrderResult::Ok(())
        }
        .await;
        self.discard_on_error(res).await?;

        let mut handles = vec![];
        for order in orders {
            tracing::info!(suborder_id = %order.suborder_id, "Suborder started.");
            self.enqueue(&order.suborder_id).await;
            handles.push(spawn_recover(self.recover_service.clone(), order.suborder_id));
        }
        Ok(handles)
    }

    async fn pause(&self, suborder_ids: &[String]) -> ApplyOrderResult<()> {
        let orders = self.load_all(suborder_ids).await?;
        for order in orders.iter() {
            order.ensure_stage(&[TicketStage::Running])?;
        }
        self.transit_all(&orders, TicketStage::Running, &OrderUpdate {
            stage: Some(TicketStage::Suspend),
            ..Default::default()
        })
        .await?;
        tracing::info!(?suborder_ids, "Suborders paused.");
        Ok(())
    }

    async fn terminate(&self, suborder_ids: &[String]) -> ApplyOrderResult<()> {
        let orders = self.load_all(suborder_ids).await?;
        for order in orders.iter() {
            order.ensure_stage(&[TicketStage::Suspend])?;
        }
        self.transit_all(
            &orders,
            TicketStage::Suspend,
            &OrderUpdate::stage_status(TicketStage::Terminate, ApplyStatus::Terminate),
        )
        .await?;
        tracing::info!(?suborder_ids, "Suborders terminated.");
        Ok(())
    }

    async fn modify(&self, request: ModifyRequest) -> ApplyOrderResult<RecoverHandle> {
        self.modify_order(request).await
    }

    async fn cancel_crp(&self, suborder_id: &str) -> ApplyOrderResult<()> {
        self.cancel_crp_tasks(suborder_id).await
    }

    async fn deliver_devices(
        &self,
        suborder_id: &str,
        device_ids: &[Uuid],
    ) -> ApplyOrderResult<ApplyOrder> {
        self.deliver(suborder_id, device_ids).await
    }

    async fn run_disk_check(&self, suborder_id: &str) -> ApplyOrderResult<()> {
        self.disk_check(suborder_id).await
    }

    async fn get_suborders(&self, order_id: u64) -> ApplyOrderResult<Vec<ApplyOrder>> {
        if self.ticket_repo.find_by_id(&order_id).await?.is_none() {
            return Err(ApplyOrderException::TicketNotFound { order_id });
        }
        Ok(self.order_repo.get_by_order_id(order_id).await?)
    }

    async fn get_steps(&self, suborder_id: &str) -> ApplyOrderResult<Vec<ApplyStep>> {
        self.get_order(suborder_id).await?;
        self.step_service.get_steps(suborder_id).await
    }

    async fn get_modify_records(&self, suborder_id: &str) -> ApplyOrderResult<Vec<ModifyRecord>> {
        self.get_order(suborder_id).await?;
        Ok(self.modify_record_repo.get_by_suborder_id(suborder_id).await?)
    }
}

impl OrderControlServiceImpl {
    async fn get_order(&self, suborder_id: &str) -> ApplyOrderResult<ApplyOrder> {
        self.order_repo.find_by_id(&suborder_id.to_owned()).await?.ok_or(
            ApplyOrderException::SubOrderNotFound {
                suborder_id: suborder_id.to_owned(),
            },
        )
    }

    /// Every named suborder, in request order. Fails on the first unknown id.
    async fn load_all(&self, suborder_ids: &[String]) -> ApplyOrderResult<Vec<ApplyOrder>> {
        if suborder_ids.is_empty() {
            return Err(ApplyOrderException::validation("No suborder given."));
        }
        let orders = self.order_repo.get_by_suborder_ids(suborder_ids).await?;
        if let Some(missing) = suborder_ids
            .iter()
            .find(|id| !orders.iter().any(|el| &el.suborder_id == *id))
        {
            return Err(ApplyOrderException::SubOrderNotFound {
                suborder_id: missing.clone(),
            });
        }
        Ok(orders)
    }

    /// Apply one stage-guarded update to every order in a single commit.
    async fn transit_all(
        &self,
        orders: &[ApplyOrder],
        from: TicketStage,
        update: &OrderUpdate,
    ) -> ApplyOrderResult<()> {
        let res = async {
            for order in orders {
                self.order_repo
                    .update_with_filter(
                        &OrderFilter::by_id(&order.suborder_id).with_stages(&[from]),
                        update,
                    )
                    .await?;
            }
            self.order_repo.save_changed().await?;
            ApplyOrderResult::Ok(())
        }
        .await;
        self.discard_on_error(res).await
    }

    async fn discard_on_error<T>(&self, res: ApplyOrderResult<T>) -> ApplyOrderResult<T> {
        if res.is_err() {
            self.order_repo.discard_changed().await?;
        }
        res
    }

    async fn enqueue(&self, suborder_id: &str) {
        if let Err(e) = self.informer.add(suborder_id.to_owned()).await {
            tracing::warn!(suborder_id, "Enqueue failed, left to the watcher: {e}");
        }
    }
}
