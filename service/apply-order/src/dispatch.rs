use std::sync::Arc;

use async_trait::async_trait;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::{ApplyOrder, ApplyStatus, StepName, TicketStage},
        vo::{CounterUpdate, DispatchOutcome, OrderFilter, OrderUpdate, UpdateOutcome},
    },
    repository::{ApplyOrderRepo, DeviceRepo},
    service::{ApplyStepService, DispatchService, GenerateService, InformerService},
};
use infrastructure_architecture::background_service::BackgroundService;
use tokio::sync::watch;
use tracing::Instrument;

/// Statuses a suborder can not be locked from.
const NOT_DISPATCHABLE: [ApplyStatus; 4] = [
    ApplyStatus::Matching,
    ApplyStatus::Done,
    ApplyStatus::Terminate,
    ApplyStatus::GracefulTerminate,
];

#[derive(typed_builder::TypedBuilder)]
pub struct DispatchServiceImpl {
    order_repo: Arc<dyn ApplyOrderRepo>,
    device_repo: Arc<dyn DeviceRepo>,
    step_service: Arc<dyn ApplyStepService>,
    generate_service: Arc<dyn GenerateService>,
}

#[async_trait]
impl DispatchService for DispatchServiceImpl {
    async fn dispatch(&self, suborder_id: &str) -> ApplyOrderResult<DispatchOutcome> {
        let mut order = self.order_repo.find_by_id(&suborder_id.to_owned()).await?.ok_or(
            ApplyOrderException::SubOrderNotFound {
                suborder_id: suborder_id.to_owned(),
            },
        )?;
        if !order.is_dispatchable() {
            tracing::debug!(
                suborder_id,
                stage = ?order.stage,
                status = ?order.status,
                "Suborder is not dispatchable, skip."
            );
            return Ok(DispatchOutcome::Skipped);
        }

        if order.is_retry_exhausted() {
            self.order_repo
                .update_immediately_with_filter(
                    &OrderFilter::by_id(suborder_id).with_stages(&[TicketStage::Running]),
                    &OrderUpdate::stage_status(TicketStage::Suspend, ApplyStatus::Terminate),
                )
                .await?;
            tracing::warn!(suborder_id, retry_time = order.retry_time, "Retries exhausted, suspend.");
            return Ok(DispatchOutcome::RetryExhausted);
        }

        let lock = self
            .order_repo
            .update_immediately_with_filter(
                &OrderFilter::by_id(suborder_id)
                    .with_stages(&[TicketStage::Running])
                    .excluding_statuses(&NOT_DISPATCHABLE)
                    .with_max_retry_time(ApplyOrder::MAX_RETRY_TIME),
                &OrderUpdate {
                    status: Some(ApplyStatus::Matching),
                    retry_time: Some(CounterUpdate::Increment),
                    ..Default::default()
                },
            )
            .await?;
        if lock == UpdateOutcome::Unmatched {
            tracing::info!(suborder_id, "Suborder is locked by another attempt.");
            return Ok(DispatchOutcome::Contended);
        }
        order.status = ApplyStatus::Matching;
        order.retry_time += 1;
        tracing::info!(suborder_id, retry_time = order.retry_time, "Suborder locked.");

        self.step_service.start_step(suborder_id, StepName::Generate).await?;

        if let Err(e) = self.generate_service.generate(&order).await {
            tracing::error!(suborder_id, "Generation failed: {e}");
            self.step_service
                .fail_step(suborder_id, StepName::Generate, &e.to_string())
                .await?;
            self.order_repo
                .update_immediately_with_filter(
                    &OrderFilter::by_id(suborder_id),
                    &OrderUpdate::stage_status(TicketStage::Suspend, ApplyStatus::Terminate),
                )
                .await?;
            return Err(e);
        }

        let produced = self.device_repo.count_unreleased(suborder_id).await?;
        let step_done = self
            .step_service
            .update_progress(suborder_id, StepName::Generate, produced, order.total_num)
            .await?;
        tracing::info!(suborder_id, produced, total = order.total_num, "Generation done.");
        Ok(DispatchOutcome::Generated {
            produced,
            step_done,
        })
    }
}

/// Pool of workers feeding suborder ids from the informer to dispatch cycles.
#[derive(typed_builder::TypedBuilder)]
pub struct Dispatcher {
    informer: Arc<dyn InformerService>,
    dispatch_service: Arc<dyn DispatchService>,
    #[builder(default = 20)]
    worker_num: usize,
    shutdown: watch::Receiver<bool>,
}

#[async_trait]
impl BackgroundService for Dispatcher {
    async fn run(&self) {
        tracing::info!(worker_num = self.worker_num, "Dispatcher started.");
        let workers = (0..self.worker_num).map(|worker| {
            let informer = self.informer.clone();
            let dispatch_service = self.dispatch_service.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(
                worker_loop(informer, dispatch_service, shutdown)
                    .instrument(tracing::info_span!("dispatch_worker", worker)),
            )
        });
        for res in futures::future::join_all(workers).await {
            if let Err(e) = res {
                tracing::error!("Dispatch worker panicked: {e}");
            }
        }
        tracing::info!("Dispatcher stopped.");
    }
}

async fn worker_loop(
    informer: Arc<dyn InformerService>,
    dispatch_service: Arc<dyn DispatchService>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let stopped = *shutdown.borrow();
        if stopped {
            break;
        }
        let key = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            key = informer.pop() => key,
        };
        let key = match key {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Informer closed, worker exits: {e}");
                break;
            }
        };
        let span = tracing::info_span!("dispatch", suborder_id = %key);
        match dispatch_service.dispatch(&key).instrument(span).await {
            Ok(outcome) => tracing::debug!(suborder_id = %key, ?outcome, "Dispatch cycle done."),
            Err(e) => tracing::error!(suborder_id = %key, "Dispatch cycle failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use domain_apply_order::mock::MemoryRepo;

    use super::*;
    use crate::FlumeInformer;

    struct Counting(std::sync::atomic::AtomicUsize);

    #[async_trait]
    impl DispatchService for Counting {
        async fn dispatch(&self, _: &str) -> ApplyOrderResult<DispatchOutcome> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(DispatchOutcome::Skipped)
        }
    }

    #[tokio::test]
    async fn workers_stop_on_shutdown() {
        let informer = Arc::new(FlumeInformer::new());
        let counting = Arc::new(Counting(Default::default()));
        let (tx, rx) = watch::channel(false);
        let dispatcher = Dispatcher::builder()
            .informer(informer.clone())
            .dispatch_service(counting.clone())
            .worker_num(3)
            .shutdown(rx)
            .build();
        let handle = tokio::spawn(async move { dispatcher.run().await });

        informer.add("1-1".into()).await.unwrap();
        informer.add("1-2".into()).await.unwrap();
        while counting.0.load(std::sync::atomic::Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn workers_exit_when_informer_closes() {
        let informer = Arc::new(FlumeInformer::new());
        let (_tx, rx) = watch::channel(false);
        let dispatcher = Dispatcher::builder()
            .informer(informer.clone())
            .dispatch_service(Arc::new(Counting(Default::default())))
            .worker_num(2)
            .shutdown(rx)
            .build();
        informer.close();
        dispatcher.run().await;
    }

    #[tokio::test]
    async fn missing_suborder_is_an_error() {
        let repo = Arc::new(MemoryRepo::new());
        let service = DispatchServiceImpl::builder()
            .order_repo(repo.clone())
            .device_repo(repo.clone())
            .step_service(Arc::new(
                crate::ApplyStepServiceImpl::builder().step_repo(repo.clone()).build(),
            ))
            .generate_service(Arc::new(crate::GenerateServiceImpl::new()))
            .build();
        let err = service.dispatch("404-1").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
