mod memory;

use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

use crate::{
    model::{
        entity::{ApplyOrder, ApplyTicket, DeviceInfo},
        vo::{
            catalog::DeviceTypeInfo,
            crp::CrpOrder,
            itsm::{ItsmCreateRequest, ItsmLog, ItsmOperateRequest, ItsmStatus},
            RequireType,
        },
    },
    service::{
        CmdbService, CrpService, DeviceCatalogService, Generator, ItsmService, MatcherService,
        QuotaService,
    },
};

pub use memory::MemoryRepo;

mock! {
    pub Generator {}
    #[async_trait]
    impl Generator for Generator {
        async fn generate(&self, order: &ApplyOrder) -> anyhow::Result<()>;
    }
}

mock! {
    pub ItsmService {}
    #[async_trait]
    impl ItsmService for ItsmService {
        async fn create_ticket(&self, request: &ItsmCreateRequest) -> anyhow::Result<String>;
        async fn terminate_ticket(
            &self,
            itsm_ticket_id: &str,
            operator: &str,
            reason: &str,
        ) -> anyhow::Result<()>;
        async fn operate_node(&self, request: &ItsmOperateRequest) -> anyhow::Result<()>;
        async fn get_ticket_status(&self, itsm_ticket_id: &str) -> anyhow::Result<ItsmStatus>;
        async fn get_ticket_log(&self, itsm_ticket_id: &str) -> anyhow::Result<Vec<ItsmLog>>;
    }
}

mock! {
    pub CrpService {}
    #[async_trait]
    impl CrpService for CrpService {
        async fn query_orders(&self, task_ids: &[String]) -> anyhow::Result<Vec<CrpOrder>>;
        async fn revoke_order(&self, task_id: &str) -> anyhow::Result<()>;
    }
}

mock! {
    pub DeviceCatalogService {}
    #[async_trait]
    impl DeviceCatalogService for DeviceCatalogService {
        async fn get_device_type_info(&self, device_type: &str) -> anyhow::Result<DeviceTypeInfo>;
    }
}

mock! {
    pub CmdbService {}
    #[async_trait]
    impl CmdbService for CmdbService {
        async fn get_host_device_type(&self, instance_id: &str) -> anyhow::Result<String>;
    }
}

mock! {
    pub QuotaService {}
    #[async_trait]
    impl QuotaService for QuotaService {
        async fn can_apply_host(
            &self,
            biz_id: i64,
            require_type: RequireType,
            replicas: u32,
        ) -> anyhow::Result<bool>;
        async fn create_applied_record(&self, ticket: &ApplyTicket) -> anyhow::Result<()>;
        async fn get_cpu_core_sum(
            &self,
            biz_id: i64,
            require_type: RequireType,
        ) -> anyhow::Result<u64>;
        async fn is_res_pool_biz(&self, biz_id: i64) -> anyhow::Result<bool>;
    }
}

mock! {
    pub MatcherService {}
    #[async_trait]
    impl MatcherService for MatcherService {
        async fn run_disk_check(&self, order: &ApplyOrder) -> anyhow::Result<()>;
        async fn process_init_step(
            &self,
            order: &ApplyOrder,
            devices: &[DeviceInfo],
        ) -> anyhow::Result<()>;
        async fn deliver_devices(
            &self,
            order: &ApplyOrder,
            devices: &[DeviceInfo],
        ) -> anyhow::Result<()>;
        async fn set_device_delivered(&self, device_ids: &[Uuid]) -> anyhow::Result<()>;
        async fn final_apply_step(&self, order: &ApplyOrder) -> anyhow::Result<()>;
    }
}
