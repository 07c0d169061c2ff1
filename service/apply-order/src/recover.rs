use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::ApplyStatus,
        vo::{RecoverHandle, RetryOutcome},
    },
    repository::{ApplyOrderRepo, DeviceRepo, GenerateRecordRepo},
    service::RecoverService,
};
use tokio::time::Instant;
use tracing::Instrument;

#[derive(typed_builder::TypedBuilder)]
pub struct RecoverServiceImpl {
    order_repo: Arc<dyn ApplyOrderRepo>,
    device_repo: Arc<dyn DeviceRepo>,
    generate_record_repo: Arc<dyn GenerateRecordRepo>,
    #[builder(default = Duration::from_secs(1))]
    interval: Duration,
    #[builder(default = Duration::from_secs(600))]
    timeout: Duration,
}

#[async_trait]
impl RecoverService for RecoverServiceImpl {
    async fn retry_failed_devices(&self, suborder_id: &str) -> ApplyOrderResult<RetryOutcome> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let order = self.order_repo.find_by_id(&suborder_id.to_owned()).await?.ok_or(
                ApplyOrderException::SubOrderNotFound {
                    suborder_id: suborder_id.to_owned(),
                },
            )?;
            if order.status != ApplyStatus::WaitForMatch {
                order.ensure_status(&[ApplyStatus::Matching])?;
                return self.release_undelivered(suborder_id, order.total_num).await;
            }
            if Instant::now() >= deadline {
                return Err(ApplyOrderException::Timeout {
                    operation: format!("waiting for suborder {suborder_id} to be dispatched"),
                    secs: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

impl RecoverServiceImpl {
    async fn release_undelivered(
        &self,
        suborder_id: &str,
        total_num: u32,
    ) -> ApplyOrderResult<RetryOutcome> {
        let produced = self.device_repo.count_unreleased(suborder_id).await?;
        if produced >= total_num {
            return Ok(RetryOutcome::AlreadyProduced);
        }
        let generate_ids = self
            .device_repo
            .get_undelivered(suborder_id)
            .await?
            .into_iter()
            .map(|el| el.generate_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        if !generate_ids.is_empty() {
            self.generate_record_repo.reset_matched_immediately(&generate_ids).await?;
        }
        Ok(RetryOutcome::Rematched { generate_ids })
    }
}

/// Run the recovery loop of a suborder in the background.
pub fn spawn_recover(service: Arc<dyn RecoverService>, suborder_id: String) -> RecoverHandle {
    let span = tracing::info_span!("retry_failed_devices", suborder_id = %suborder_id);
    let id = suborder_id.clone();
    let inner = tokio::spawn(
        async move {
            let res = service.retry_failed_devices(&id).await;
            match &res {
                Ok(outcome) => tracing::info!(?outcome, "Recovery finished."),
                Err(e) => tracing::error!("Recovery failed: {e}"),
            }
            res
        }
        .instrument(span),
    );
    RecoverHandle::new(suborder_id, inner)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domain_apply_order::{
        mock::MemoryRepo,
        model::entity::{ApplyOrder, DeviceInfo, GenerateRecord, TicketStage},
    };
    use uuid::Uuid;

    use super::*;

    fn service(repo: Arc<MemoryRepo>) -> RecoverServiceImpl {
        RecoverServiceImpl::builder()
            .order_repo(repo.clone())
            .device_repo(repo.clone())
            .generate_record_repo(repo)
            .build()
    }

    fn device(generate_id: u64, is_delivered: bool) -> DeviceInfo {
        DeviceInfo {
            id: Uuid::new_v4(),
            suborder_id: "5-1".into(),
            generate_id,
            is_delivered,
            create_at: Utc::now(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn releases_distinct_generation_records() {
        let repo = Arc::new(MemoryRepo::new());
        repo.seed_order(ApplyOrder {
            suborder_id: "5-1".into(),
            stage: TicketStage::Running,
            status: ApplyStatus::Matching,
            total_num: 5,
            ..Default::default()
        });
        repo.seed_device(device(1, false));
        repo.seed_device(device(1, false));
        repo.seed_device(device(2, true));
        for generate_id in [1, 2] {
            repo.seed_generate_record(GenerateRecord {
                generate_id,
                suborder_id: "5-1".into(),
                is_matched: true,
                ..Default::default()
            });
        }

        let outcome = service(repo.clone()).retry_failed_devices("5-1").await.unwrap();
        assert_eq!(outcome, RetryOutcome::Rematched { generate_ids: vec![1] });
        assert!(!repo.generate_record(1).unwrap().is_matched);
        assert!(repo.generate_record(2).unwrap().is_matched);
    }

    #[tokio::test]
    async fn produced_enough_is_a_no_op() {
        let repo = Arc::new(MemoryRepo::new());
        repo.seed_order(ApplyOrder {
            suborder_id: "5-1".into(),
            status: ApplyStatus::Matching,
            total_num: 1,
            ..Default::default()
        });
        repo.seed_device(device(1, false));
        let outcome = service(repo).retry_failed_devices("5-1").await.unwrap();
        assert_eq!(outcome, RetryOutcome::AlreadyProduced);
    }

    #[tokio::test]
    async fn unexpected_status_aborts() {
        let repo = Arc::new(MemoryRepo::new());
        repo.seed_order(ApplyOrder {
            suborder_id: "5-1".into(),
            status: ApplyStatus::Terminate,
            ..Default::default()
        });
        let err = service(repo).retry_failed_devices("5-1").await.unwrap_err();
        assert!(matches!(err, ApplyOrderException::InvalidOrderStatus { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_reports_timeout() {
        let repo = Arc::new(MemoryRepo::new());
        repo.seed_order(ApplyOrder {
            suborder_id: "5-1".into(),
            status: ApplyStatus::WaitForMatch,
            ..Default::default()
        });
        let handle = spawn_recover(Arc::new(service(repo)), "5-1".into());
        assert_eq!(handle.suborder_id(), "5-1");
        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, ApplyOrderException::Timeout { secs: 600, .. }));
    }
}
