mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use domain_apply_order::{
    exception::ApplyOrderException,
    mock::{MemoryRepo, MockGenerator},
    model::{
        entity::{ApplyOrder, ApplyStatus, StepName, StepStatus, TicketStage},
        vo::{DispatchOutcome, ResourceType},
    },
    service::{DispatchService, Generator},
};
use service_apply_order::{DispatchServiceImpl, GenerateServiceImpl};

fn dispatcher(repo: &Arc<MemoryRepo>, generator: Arc<dyn Generator>) -> DispatchServiceImpl {
    DispatchServiceImpl::builder()
        .order_repo(repo.clone())
        .device_repo(repo.clone())
        .step_service(step_service(repo))
        .generate_service(Arc::new(
            GenerateServiceImpl::new().register(ResourceType::QCloudCvm, generator),
        ))
        .build()
}

/// Produces every device of the suborder, slowly.
struct SlowGenerator {
    repo: Arc<MemoryRepo>,
    calls: AtomicUsize,
}

#[async_trait]
impl Generator for SlowGenerator {
    async fn generate(&self, order: &ApplyOrder) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        for i in 0..order.total_num {
            self.repo.seed_device(device(order, i as u64 + 1));
        }
        Ok(())
    }
}

#[tokio::test]
async fn generates_every_device() {
    let repo = Arc::new(MemoryRepo::new());
    seed_with_ledger(&repo, order("7-1", TicketStage::Running, ApplyStatus::WaitForMatch, 5));
    let mut generator = MockGenerator::new();
    let devices = repo.clone();
    generator.expect_generate().times(1).returning(move |order| {
        for i in 0..5 {
            devices.seed_device(device(order, i + 1));
        }
        Ok(())
    });

    let outcome = dispatcher(&repo, Arc::new(generator)).dispatch("7-1").await.unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Generated {
            produced: 5,
            step_done: true
        }
    );
    let step = repo.step("7-1", StepName::Generate).unwrap();
    assert_eq!(step.status, StepStatus::Success);
    assert_eq!(step.success_num, 5);
    let order = repo.order("7-1").unwrap();
    assert_eq!(order.status, ApplyStatus::Matching);
    assert_eq!(order.retry_time, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_generation_per_suborder() {
    let repo = Arc::new(MemoryRepo::new());
    seed_with_ledger(&repo, order("7-2", TicketStage::Running, ApplyStatus::WaitForMatch, 3));
    let generator = Arc::new(SlowGenerator {
        repo: repo.clone(),
        calls: AtomicUsize::new(0),
    });
    let service = Arc::new(dispatcher(&repo, generator.clone()));

    let cycles = (0..8).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.dispatch("7-2").await })
    });
    let outcomes = futures::future::join_all(cycles)
        .await
        .into_iter()
        .map(|el| el.unwrap().unwrap())
        .collect::<Vec<_>>();

    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|el| matches!(el, DispatchOutcome::Generated { .. }))
            .count(),
        1
    );
    assert!(outcomes.iter().all(|el| matches!(
        el,
        DispatchOutcome::Generated { .. } | DispatchOutcome::Contended | DispatchOutcome::Skipped
    )));
    assert_eq!(repo.order("7-2").unwrap().retry_time, 1);
}

#[tokio::test]
async fn exhausted_retries_suspend_without_generating() {
    let repo = Arc::new(MemoryRepo::new());
    let mut exhausted = order("7-3", TicketStage::Running, ApplyStatus::WaitForMatch, 2);
    exhausted.retry_time = 4;
    seed_with_ledger(&repo, exhausted);
    let mut generator = MockGenerator::new();
    generator.expect_generate().never();

    let outcome = dispatcher(&repo, Arc::new(generator)).dispatch("7-3").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::RetryExhausted);
    let order = repo.order("7-3").unwrap();
    assert_eq!(order.stage, TicketStage::Suspend);
    assert_eq!(order.status, ApplyStatus::Terminate);
    assert_eq!(order.retry_time, 4);
}

#[tokio::test]
async fn locked_or_stopped_suborders_are_skipped() {
    let repo = Arc::new(MemoryRepo::new());
    seed_with_ledger(&repo, order("7-4", TicketStage::Running, ApplyStatus::Matching, 2));
    seed_with_ledger(&repo, order("7-5", TicketStage::Suspend, ApplyStatus::WaitForMatch, 2));
    let mut generator = MockGenerator::new();
    generator.expect_generate().never();
    let service = dispatcher(&repo, Arc::new(generator));

    assert_eq!(service.dispatch("7-4").await.unwrap(), DispatchOutcome::Skipped);
    assert_eq!(service.dispatch("7-5").await.unwrap(), DispatchOutcome::Skipped);
    assert_eq!(repo.order("7-4").unwrap().retry_time, 0);
}

#[tokio::test]
async fn generation_failure_suspends_and_fails_step() {
    let repo = Arc::new(MemoryRepo::new());
    seed_with_ledger(&repo, order("7-6", TicketStage::Running, ApplyStatus::WaitForMatch, 2));
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .returning(|_| Err(anyhow::anyhow!("CRP quota exhausted")));

    let err = dispatcher(&repo, Arc::new(generator)).dispatch("7-6").await.unwrap_err();

    assert!(matches!(err, ApplyOrderException::External { .. }));
    let step = repo.step("7-6", StepName::Generate).unwrap();
    assert_eq!(step.status, StepStatus::Failed);
    assert!(step.message.contains("CRP quota exhausted"));
    let order = repo.order("7-6").unwrap();
    assert_eq!(order.stage, TicketStage::Suspend);
    assert_eq!(order.status, ApplyStatus::Terminate);
}

#[tokio::test]
async fn partial_generation_keeps_step_handling() {
    let repo = Arc::new(MemoryRepo::new());
    seed_with_ledger(&repo, order("7-7", TicketStage::Running, ApplyStatus::MatchedSome, 4));
    let mut generator = MockGenerator::new();
    let devices = repo.clone();
    generator.expect_generate().returning(move |order| {
        devices.seed_device(device(order, 1));
        Ok(())
    });

    let outcome = dispatcher(&repo, Arc::new(generator)).dispatch("7-7").await.unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Generated {
            produced: 1,
            step_done: false
        }
    );
    let step = repo.step("7-7", StepName::Generate).unwrap();
    assert_eq!(step.status, StepStatus::Handling);
    assert_eq!(step.running_num, 3);
}
