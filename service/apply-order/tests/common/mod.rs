#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use domain_apply_order::{
    mock::{MemoryRepo, MockCrpService, MockDeviceCatalogService, MockMatcherService},
    model::{
        entity::{ApplyOrder, ApplyStatus, ApplyStep, ApplyTicket, DeviceInfo, TicketStage},
        vo::{catalog::DeviceTypeInfo, ResourceSpec, ResourceType},
    },
    service::ApplyStepService,
};
use service_apply_order::{
    ApplyStepServiceImpl, FlumeInformer, OrderControlServiceImpl, RecoverServiceImpl,
};
use uuid::Uuid;

/// `(device_type, device_group, core_size, cpu_core, is_gpu)`
const CATALOG: [(&str, &str, &str, u64, bool); 6] = [
    ("S5.LARGE8", "S5", "large", 8, false),
    ("S5.LARGE16", "S5", "large", 16, false),
    ("S5.SMALL2", "S5", "small", 2, false),
    ("IT5.LARGE8", "IT5", "large", 8, false),
    ("GN7.LARGE20", "GN7", "large", 20, true),
    ("S5.LARGEMAX", "S5", "large", u64::MAX, false),
];

pub fn catalog() -> MockDeviceCatalogService {
    let mut catalog = MockDeviceCatalogService::new();
    catalog.expect_get_device_type_info().returning(|device_type| {
        CATALOG
            .iter()
            .find(|el| el.0 == device_type)
            .map(|el| DeviceTypeInfo {
                device_type: el.0.to_owned(),
                device_group: el.1.to_owned(),
                core_size: el.2.to_owned(),
                cpu_core: el.3,
                is_gpu: el.4,
            })
            .ok_or(anyhow::anyhow!("Unknown device type {device_type}."))
    });
    catalog
}

pub fn spec(device_type: &str) -> ResourceSpec {
    ResourceSpec {
        region: "ap-guangzhou".into(),
        zone: "ap-guangzhou-3".into(),
        device_type: device_type.into(),
        image_id: "img-tlinux".into(),
        ..Default::default()
    }
}

pub fn order(suborder_id: &str, stage: TicketStage, status: ApplyStatus, total: u32) -> ApplyOrder {
    let order_id = suborder_id
        .split('-')
        .next()
        .and_then(|el| el.parse().ok())
        .unwrap_or_default();
    ApplyOrder {
        order_id,
        suborder_id: suborder_id.into(),
        biz_id: 100,
        user: "alice".into(),
        resource_type: ResourceType::QCloudCvm,
        stage,
        status,
        origin_num: total,
        total_num: total,
        pending_num: total,
        applied_core: 8 * total as u64,
        spec: spec("S5.LARGE8"),
        create_at: Utc::now(),
        update_at: Utc::now(),
        ..Default::default()
    }
}

pub fn ticket(order_id: u64, stage: TicketStage) -> ApplyTicket {
    ApplyTicket {
        order_id,
        itsm_ticket_id: format!("ITSM-{order_id}"),
        stage,
        biz_id: 100,
        user: "alice".into(),
        create_at: Utc::now(),
        update_at: Utc::now(),
        ..Default::default()
    }
}

pub fn device(order: &ApplyOrder, generate_id: u64) -> DeviceInfo {
    DeviceInfo {
        id: Uuid::new_v4(),
        order_id: order.order_id,
        suborder_id: order.suborder_id.clone(),
        generate_id,
        asset_id: format!("TC{generate_id:06}"),
        ip: "10.0.0.1".into(),
        device_type: order.spec.device_type.clone(),
        zone: order.spec.zone.clone(),
        create_at: Utc::now(),
        ..Default::default()
    }
}

/// Seed the order together with a fresh step ledger.
pub fn seed_with_ledger(repo: &MemoryRepo, order: ApplyOrder) {
    for step in ApplyStep::ledger_for(&order, Utc::now()) {
        repo.seed_step(step);
    }
    repo.seed_order(order);
}

pub fn step_service(repo: &Arc<MemoryRepo>) -> Arc<dyn ApplyStepService> {
    Arc::new(ApplyStepServiceImpl::builder().step_repo(repo.clone()).build())
}

pub struct ControlDeps {
    pub catalog: MockDeviceCatalogService,
    pub crp: MockCrpService,
    pub matcher: MockMatcherService,
}

impl Default for ControlDeps {
    fn default() -> Self {
        Self {
            catalog: catalog(),
            crp: MockCrpService::new(),
            matcher: MockMatcherService::new(),
        }
    }
}

pub fn control(
    repo: &Arc<MemoryRepo>,
    informer: &Arc<FlumeInformer>,
    deps: ControlDeps,
) -> OrderControlServiceImpl {
    OrderControlServiceImpl::builder()
        .order_repo(repo.clone())
        .ticket_repo(repo.clone())
        .modify_record_repo(repo.clone())
        .device_repo(repo.clone())
        .generate_record_repo(repo.clone())
        .step_service(step_service(repo))
        .recover_service(Arc::new(
            RecoverServiceImpl::builder()
                .order_repo(repo.clone())
                .device_repo(repo.clone())
                .generate_record_repo(repo.clone())
                .build(),
        ))
        .informer(informer.clone())
        .catalog(Arc::new(deps.catalog))
        .crp(Arc::new(deps.crp))
        .matcher(Arc::new(deps.matcher))
        .build()
}
