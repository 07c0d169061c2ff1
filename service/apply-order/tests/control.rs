mod common;

use std::sync::Arc;

use common::*;
use domain_apply_order::{
    exception::ApplyOrderException,
    mock::MemoryRepo,
    model::{
        entity::{
            ApplyStatus, GenerateRecord, GenerateStatus, StepName, StepStatus, TicketStage,
        },
        vo::{
            crp::{CrpOrder, CrpOrderStatus},
            request::ModifyRequest,
            ResourceType,
        },
    },
    service::{ApplyStepService, OrderControlService},
};
use service_apply_order::FlumeInformer;

fn setup() -> (Arc<MemoryRepo>, Arc<FlumeInformer>) {
    (Arc::new(MemoryRepo::new()), Arc::new(FlumeInformer::new()))
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|el| el.to_string()).collect()
}

#[tokio::test]
async fn start_resets_suspended_suborders() {
    let (repo, informer) = setup();
    let mut suspended = order("8-1", TicketStage::Suspend, ApplyStatus::Terminate, 3);
    suspended.retry_time = 4;
    seed_with_ledger(&repo, suspended);
    step_service(&repo)
        .fail_step("8-1", StepName::Generate, "no stock")
        .await
        .unwrap();
    let service = control(&repo, &informer, ControlDeps::default());

    let handles = service.start(&ids(&["8-1"])).await.unwrap();

    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].suborder_id(), "8-1");
    let order = repo.order("8-1").unwrap();
    assert_eq!(order.stage, TicketStage::Running);
    assert_eq!(order.status, ApplyStatus::WaitForMatch);
    assert_eq!(order.retry_time, 0);
    let step = repo.step("8-1", StepName::Generate).unwrap();
    assert_eq!(step.status, StepStatus::Handling);
    assert!(step.message.is_empty());
    assert_eq!(informer.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn recovery_of_started_suborder_times_out() {
    let (repo, informer) = setup();
    seed_with_ledger(&repo, order("8-2", TicketStage::Suspend, ApplyStatus::WaitForMatch, 3));
    let service = control(&repo, &informer, ControlDeps::default());

    let mut handles = service.start(&ids(&["8-2"])).await.unwrap();
    let started = tokio::time::Instant::now();
    let err = handles.remove(0).join().await.unwrap_err();

    assert!(matches!(err, ApplyOrderException::Timeout { secs: 600, .. }));
    assert!(started.elapsed() < std::time::Duration::from_secs(11 * 60));
}

#[tokio::test]
async fn start_is_all_or_nothing() {
    let (repo, informer) = setup();
    seed_with_ledger(&repo, order("8-3", TicketStage::Suspend, ApplyStatus::Terminate, 1));
    seed_with_ledger(&repo, order("8-4", TicketStage::Running, ApplyStatus::Matching, 1));
    let service = control(&repo, &informer, ControlDeps::default());

    let err = service.start(&ids(&["8-3", "8-4"])).await.unwrap_err();

    assert!(matches!(err, ApplyOrderException::InvalidOrderStage { suborder_id, .. } if suborder_id == "8-4"));
    assert_eq!(repo.order("8-3").unwrap().stage, TicketStage::Suspend);
    assert!(informer.is_empty());
}

#[tokio::test]
async fn lifecycle_operations_reject_wrong_stage() {
    let (repo, informer) = setup();
    seed_with_ledger(&repo, order("8-5", TicketStage::Running, ApplyStatus::Matching, 1));
    seed_with_ledger(&repo, order("8-6", TicketStage::Terminate, ApplyStatus::Terminate, 1));
    seed_with_ledger(&repo, order("8-7", TicketStage::Done, ApplyStatus::Done, 1));
    let service = control(&repo, &informer, ControlDeps::default());

    for id in ["8-5", "8-6", "8-7"] {
        let suborder_ids = ids(&[id]);
        assert!(matches!(
            service.start(&suborder_ids).await.unwrap_err(),
            ApplyOrderException::InvalidOrderStage { .. }
        ));
        assert!(matches!(
            service.terminate(&suborder_ids).await.unwrap_err(),
            ApplyOrderException::InvalidOrderStage { .. }
        ));
        let err = service
            .modify(ModifyRequest {
                suborder_id: id.into(),
                operator: "alice".into(),
                replicas: 1,
                spec: spec("S5.LARGE8"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplyOrderException::InvalidOrderStage { .. }));
    }
    assert!(matches!(
        service.pause(&ids(&["8-6"])).await.unwrap_err(),
        ApplyOrderException::InvalidOrderStage { .. }
    ));
}

#[tokio::test]
async fn terminate_batch_fails_as_a_whole() {
    let (repo, informer) = setup();
    seed_with_ledger(&repo, order("8-8", TicketStage::Suspend, ApplyStatus::Terminate, 1));
    seed_with_ledger(&repo, order("8-9", TicketStage::Suspend, ApplyStatus::WaitForMatch, 1));
    seed_with_ledger(&repo, order("8-10", TicketStage::Running, ApplyStatus::Matching, 1));
    let service = control(&repo, &informer, ControlDeps::default());

    let err = service.terminate(&ids(&["8-8", "8-9", "8-10"])).await.unwrap_err();

    assert!(matches!(err, ApplyOrderException::InvalidOrderStage { .. }));
    assert_eq!(repo.order("8-8").unwrap().stage, TicketStage::Suspend);
    assert_eq!(repo.order("8-9").unwrap().stage, TicketStage::Suspend);
    assert_eq!(repo.order("8-10").unwrap().stage, TicketStage::Running);

    service.terminate(&ids(&["8-8", "8-9"])).await.unwrap();
    let order = repo.order("8-9").unwrap();
    assert_eq!(order.stage, TicketStage::Terminate);
    assert_eq!(order.status, ApplyStatus::Terminate);
}

#[tokio::test]
async fn pause_then_unknown_suborder() {
    let (repo, informer) = setup();
    seed_with_ledger(&repo, order("8-11", TicketStage::Running, ApplyStatus::MatchedSome, 2));
    let service = control(&repo, &informer, ControlDeps::default());

    service.pause(&ids(&["8-11"])).await.unwrap();
    let order = repo.order("8-11").unwrap();
    assert_eq!(order.stage, TicketStage::Suspend);
    assert_eq!(order.status, ApplyStatus::MatchedSome);

    let err = service.pause(&ids(&["8-11", "8-404"])).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::SubOrderNotFound { suborder_id } if suborder_id == "8-404"));
    assert!(matches!(
        service.pause(&[]).await.unwrap_err(),
        ApplyOrderException::Validation { .. }
    ));
}

fn modifiable(repo: &MemoryRepo, suborder_id: &str) {
    let mut suspended = order(suborder_id, TicketStage::Suspend, ApplyStatus::Terminate, 4);
    suspended.success_num = 1;
    suspended.pending_num = 3;
    suspended.delivered_core = 8;
    suspended.retry_time = 4;
    suspended.spec.failed_zone_ids = vec!["ap-guangzhou-3".into()];
    seed_with_ledger(repo, suspended);
}

fn modify_request(suborder_id: &str, replicas: u32, device_type: &str) -> ModifyRequest {
    ModifyRequest {
        suborder_id: suborder_id.into(),
        operator: "bob".into(),
        replicas,
        spec: spec(device_type),
    }
}

#[tokio::test]
async fn modify_rewrites_spec_and_records_snapshots() {
    let (repo, informer) = setup();
    modifiable(&repo, "9-1");
    let service = control(&repo, &informer, ControlDeps::default());
    let before = repo.order("9-1").unwrap();
    let mut request = modify_request("9-1", 2, "S5.LARGE8");
    request.spec.zone = "ap-guangzhou-4".into();

    let handle = service.modify(request).await.unwrap();

    assert_eq!(handle.suborder_id(), "9-1");
    let order = repo.order("9-1").unwrap();
    assert_eq!(order.stage, TicketStage::Running);
    assert_eq!(order.status, ApplyStatus::WaitForMatch);
    assert_eq!(order.retry_time, 0);
    assert_eq!(order.modify_time, 1);
    assert_eq!(order.total_num, 3);
    assert_eq!(order.pending_num, 2);
    assert_eq!(order.success_num, 1);
    assert_eq!(order.spec.zone, "ap-guangzhou-4");
    assert!(order.spec.failed_zone_ids.is_empty());
    assert!(order.counts_conserved());

    let records = service.get_modify_records("9-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operator, "bob");
    assert_eq!(records[0].pre_data, before.snapshot());
    assert_eq!(records[0].cur_data, order.snapshot());
    assert_eq!(informer.len(), 1);
}

#[tokio::test]
async fn modify_validation_chain() {
    let (repo, informer) = setup();
    modifiable(&repo, "9-2");
    let service = control(&repo, &informer, ControlDeps::default());

    let err = service.modify(modify_request("9-2", 0, "S5.LARGE8")).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::InvalidReplicas { .. }));
    let err = service.modify(modify_request("9-2", 4, "S5.LARGE8")).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::InvalidReplicas { origin_num: 4, .. }));
    let err = service.modify(modify_request("9-2", u32::MAX, "S5.LARGE8")).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::InvalidReplicas { replicas: u32::MAX, .. }));
    let err = service.modify(modify_request("9-2", 3, "S5.LARGE16")).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::CoreExceeded { required: 56, applied: 32, .. }));
    let err = service.modify(modify_request("9-2", 2, "S5.LARGEMAX")).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::CoreExceeded { required: u64::MAX, .. }));
    let err = service.modify(modify_request("9-2", 2, "IT5.LARGE8")).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::DeviceGroupMismatch { expected, .. } if expected == "S5"));
    let err = service.modify(modify_request("9-2", 2, "S5.SMALL2")).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::DeviceSizeMismatch { expected, .. } if expected == "large"));
    let mut request = modify_request("9-2", 2, "S5.LARGE8");
    request.spec.region = "ap-shanghai".into();
    let err = service.modify(request).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::RegionImmutable { .. }));

    let order = repo.order("9-2").unwrap();
    assert_eq!(order.stage, TicketStage::Suspend);
    assert_eq!(order.spec.device_type, "S5.LARGE8");
    assert_eq!(order.modify_time, 0);
    assert!(repo.records_of("9-2").is_empty());
}

#[tokio::test]
async fn upgrade_suborders_are_not_modifiable() {
    let (repo, informer) = setup();
    let mut upgrade = order("9-3", TicketStage::Suspend, ApplyStatus::Terminate, 1);
    upgrade.resource_type = ResourceType::UpgradeCvm;
    seed_with_ledger(&repo, upgrade);
    let service = control(&repo, &informer, ControlDeps::default());

    let err = service.modify(modify_request("9-3", 1, "S5.LARGE8")).await.unwrap_err();

    assert!(matches!(err, ApplyOrderException::UpgradeNotModifiable { .. }));
}

fn generate_record(generate_id: u64, suborder_id: &str, task_id: &str) -> GenerateRecord {
    GenerateRecord {
        generate_id,
        suborder_id: suborder_id.into(),
        task_id: task_id.into(),
        status: GenerateStatus::Handling,
        ..Default::default()
    }
}

#[tokio::test]
async fn cancel_crp_revokes_and_aggregates_failures() {
    let (repo, informer) = setup();
    seed_with_ledger(&repo, order("10-1", TicketStage::Running, ApplyStatus::Matching, 3));
    repo.seed_generate_record(generate_record(1, "10-1", "crp-1"));
    repo.seed_generate_record(generate_record(2, "10-1", "crp-2"));
    repo.seed_generate_record(GenerateRecord {
        status: GenerateStatus::Success,
        ..generate_record(3, "10-1", "crp-3")
    });
    let mut deps = ControlDeps::default();
    deps.crp
        .expect_query_orders()
        .withf(|task_ids| task_ids.to_vec() == ["crp-1", "crp-2"])
        .returning(|task_ids| {
            Ok(task_ids
                .iter()
                .map(|el| CrpOrder {
                    task_id: el.clone(),
                    status: CrpOrderStatus::Producing,
                    revocable: true,
                })
                .collect())
        });
    deps.crp.expect_revoke_order().times(2).returning(|task_id| {
        if task_id == "crp-2" {
            anyhow::bail!("order is being delivered");
        }
        Ok(())
    });
    let service = control(&repo, &informer, deps);

    let err = service.cancel_crp("10-1").await.unwrap_err();

    let ApplyOrderException::RevokeFailed { failures } = err else {
        panic!("expected revoke failure");
    };
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("crp-2"));
    assert_eq!(repo.order("10-1").unwrap().status, ApplyStatus::GracefulTerminate);
}

#[tokio::test]
async fn cancel_crp_needs_every_task_id() {
    let (repo, informer) = setup();
    seed_with_ledger(&repo, order("10-2", TicketStage::Running, ApplyStatus::MatchedSome, 3));
    repo.seed_generate_record(generate_record(4, "10-2", "crp-4"));
    repo.seed_generate_record(generate_record(5, "10-2", ""));
    let mut deps = ControlDeps::default();
    deps.crp.expect_query_orders().never();
    let service = control(&repo, &informer, deps);

    let err = service.cancel_crp("10-2").await.unwrap_err();

    assert!(matches!(err, ApplyOrderException::GenerationNotReady { generate_id: 5, .. }));
    assert_eq!(repo.order("10-2").unwrap().status, ApplyStatus::MatchedSome);

    seed_with_ledger(&repo, order("10-3", TicketStage::Running, ApplyStatus::WaitForMatch, 1));
    assert!(matches!(
        service.cancel_crp("10-3").await.unwrap_err(),
        ApplyOrderException::InvalidOrderStatus { .. }
    ));
}

fn matcher_for(repo: &Arc<MemoryRepo>, deps: &mut ControlDeps) {
    deps.matcher.expect_process_init_step().returning(|_, _| Ok(()));
    deps.matcher.expect_deliver_devices().returning(|_, _| Ok(()));
    let devices = repo.clone();
    deps.matcher.expect_set_device_delivered().returning(move |ids| {
        devices.mark_delivered(ids);
        Ok(())
    });
}

#[tokio::test]
async fn deliver_advances_counters_and_finishes_ticket() {
    let (repo, informer) = setup();
    repo.seed_ticket(ticket(11, TicketStage::Running));
    let running = order("11-1", TicketStage::Running, ApplyStatus::Matching, 2);
    let first = device(&running, 1);
    let second = device(&running, 1);
    repo.seed_device(first.clone());
    repo.seed_device(second.clone());
    seed_with_ledger(&repo, running);
    let mut deps = ControlDeps::default();
    matcher_for(&repo, &mut deps);
    deps.matcher.expect_final_apply_step().times(1).returning(|_| Ok(()));
    let service = control(&repo, &informer, deps);

    let order = service.deliver_devices("11-1", &[first.id]).await.unwrap();
    assert_eq!(order.status, ApplyStatus::MatchedSome);
    assert_eq!(order.success_num, 1);
    assert_eq!(order.pending_num, 1);
    assert_eq!(order.delivered_core, 8);
    assert_eq!(repo.step("11-1", StepName::Deliver).unwrap().status, StepStatus::Handling);
    assert_eq!(repo.ticket(11).unwrap().stage, TicketStage::Running);

    let err = service.deliver_devices("11-1", &[first.id]).await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::Validation { .. }));

    let order = service.deliver_devices("11-1", &[second.id]).await.unwrap();
    assert_eq!(order.stage, TicketStage::Done);
    assert_eq!(order.status, ApplyStatus::Done);
    assert_eq!(order.delivered_core, 16);
    assert_eq!(repo.step("11-1", StepName::Deliver).unwrap().status, StepStatus::Success);
    assert_eq!(repo.step("11-1", StepName::Init).unwrap().status, StepStatus::Success);
    assert_eq!(repo.ticket(11).unwrap().stage, TicketStage::Done);
}

#[tokio::test]
async fn interleaved_deliveries_keep_every_device() {
    let (repo, informer) = setup();
    repo.seed_ticket(ticket(14, TicketStage::Running));
    let running = order("14-1", TicketStage::Running, ApplyStatus::Matching, 2);
    let ours = device(&running, 1);
    let theirs = device(&running, 2);
    repo.seed_device(ours.clone());
    repo.seed_device(theirs.clone());
    seed_with_ledger(&repo, running);

    let mut deps = ControlDeps::default();
    deps.matcher.expect_process_init_step().returning(|_, _| Ok(()));
    let devices = repo.clone();
    deps.matcher.expect_set_device_delivered().returning(move |ids| {
        devices.mark_delivered(ids);
        Ok(())
    });
    deps.matcher.expect_final_apply_step().times(1).returning(|_| Ok(()));
    // Another delivery commits while the matcher handles ours.
    let other = repo.clone();
    let theirs_id = theirs.id;
    deps.matcher.expect_deliver_devices().times(1).returning(move |_, _| {
        let mut order = other.order("14-1").unwrap();
        order.success_num = 1;
        order.pending_num = 1;
        order.delivered_core = 8;
        order.status = ApplyStatus::MatchedSome;
        other.seed_order(order);
        other.mark_delivered(&[theirs_id]);
        Ok(())
    });
    let service = control(&repo, &informer, deps);

    let order = service.deliver_devices("14-1", &[ours.id]).await.unwrap();

    assert_eq!(order.success_num, 2);
    assert_eq!(order.pending_num, 0);
    assert_eq!(order.delivered_core, 16);
    assert_eq!(order.stage, TicketStage::Done);
    assert_eq!(order.status, ApplyStatus::Done);
    assert_eq!(repo.step("14-1", StepName::Deliver).unwrap().status, StepStatus::Success);
    assert_eq!(repo.ticket(14).unwrap().stage, TicketStage::Done);
}

#[tokio::test]
async fn ticket_waits_for_running_siblings() {
    let (repo, informer) = setup();
    repo.seed_ticket(ticket(12, TicketStage::Running));
    let running = order("12-1", TicketStage::Running, ApplyStatus::Matching, 1);
    let produced = device(&running, 1);
    repo.seed_device(produced.clone());
    seed_with_ledger(&repo, running);
    seed_with_ledger(&repo, order("12-2", TicketStage::Running, ApplyStatus::Matching, 1));
    let mut deps = ControlDeps::default();
    matcher_for(&repo, &mut deps);
    deps.matcher.expect_final_apply_step().returning(|_| Ok(()));
    let service = control(&repo, &informer, deps);

    service.deliver_devices("12-1", &[produced.id]).await.unwrap();

    assert_eq!(repo.order("12-1").unwrap().stage, TicketStage::Done);
    assert_eq!(repo.ticket(12).unwrap().stage, TicketStage::Running);
}

#[tokio::test]
async fn disk_check_records_step_outcome() {
    let (repo, informer) = setup();
    let mut checked = order("13-1", TicketStage::Running, ApplyStatus::Matching, 2);
    checked.enable_disk_check = true;
    seed_with_ledger(&repo, checked);
    seed_with_ledger(&repo, order("13-2", TicketStage::Running, ApplyStatus::Matching, 2));
    let mut deps = ControlDeps::default();
    deps.matcher
        .expect_run_disk_check()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("bad sector on /dev/vdb")));
    let service = control(&repo, &informer, deps);

    let err = service.run_disk_check("13-1").await.unwrap_err();
    assert!(matches!(err, ApplyOrderException::External { .. }));
    let step = repo.step("13-1", StepName::DiskCheck).unwrap();
    assert_eq!(step.status, StepStatus::Failed);
    assert!(step.message.contains("bad sector"));

    assert!(matches!(
        service.run_disk_check("13-2").await.unwrap_err(),
        ApplyOrderException::Validation { .. }
    ));
}

#[tokio::test]
async fn queries_check_existence() {
    let (repo, informer) = setup();
    repo.seed_ticket(ticket(14, TicketStage::Running));
    seed_with_ledger(&repo, order("14-1", TicketStage::Running, ApplyStatus::WaitForMatch, 1));
    let service = control(&repo, &informer, ControlDeps::default());

    assert_eq!(service.get_suborders(14).await.unwrap().len(), 1);
    assert!(matches!(
        service.get_suborders(15).await.unwrap_err(),
        ApplyOrderException::TicketNotFound { order_id: 15 }
    ));
    let steps = service.get_steps("14-1").await.unwrap();
    assert_eq!(
        steps.iter().map(|el| el.step_name).collect::<Vec<_>>(),
        [StepName::Commit, StepName::Generate, StepName::Init, StepName::Deliver]
    );
    assert!(service.get_steps("14-9").await.unwrap_err().is_not_found());
}
