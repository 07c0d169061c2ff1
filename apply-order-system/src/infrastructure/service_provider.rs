use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use domain_apply_order::{
    model::vo::ResourceType,
    service::{
        ApplyStepService, CmdbService, CrpService, DeviceCatalogService, GenerateService,
        ItsmService, MatcherService, OrderControlService, QuotaService, RecoverService,
        TicketService,
    },
};
use infrastructure_architecture::background_service::BackgroundService;
use sea_orm::DatabaseConnection;
use service_apply_order::{
    ApplyStepServiceImpl, ApprovalPolicy, AuditChain, DeviceCountRule, DispatchServiceImpl,
    Dispatcher, FlumeInformer, GenerateServiceImpl, GreenChannelBudgetPolicy,
    GreenChannelCoreRule, HostQuotaPolicy, OrderControlServiceImpl, PhysicalMachineRule,
    ReadyOrderWatcher, RecoverServiceImpl, TicketServiceImpl,
};
use tokio::sync::watch;

use super::client::{
    HttpCmdbService, HttpCrpService, HttpDeviceCatalogService, HttpGenerator, HttpItsmService,
    HttpMatcherService, HttpQuotaService, JsonClient,
};
use super::config::SystemConfig;
use super::database::OrmRepo;

/// Singletons of the process, request-scoped graphs are built on demand.
pub struct ServiceProvider {
    pub config: SystemConfig,
    db: Arc<DatabaseConnection>,
    /// Shared by the background services, which only write immediately.
    background_repo: Arc<OrmRepo>,
    informer: Arc<FlumeInformer>,
    itsm: Arc<dyn ItsmService>,
    crp: Arc<dyn CrpService>,
    catalog: Arc<dyn DeviceCatalogService>,
    cmdb: Arc<dyn CmdbService>,
    matcher: Arc<dyn MatcherService>,
    generate_service: Arc<dyn GenerateService>,
    audit_chain: Arc<AuditChain>,
    approval_policies: Vec<Arc<dyn ApprovalPolicy>>,
    recover_service: Arc<dyn RecoverService>,
    shutdown: watch::Sender<bool>,
}

impl ServiceProvider {
    pub async fn build(config: config::Config) -> anyhow::Result<Self> {
        let config: SystemConfig = config.try_deserialize()?;
        let db = Arc::new(
            sea_orm::Database::connect(config.db.url.as_str())
                .await
                .context("Cannot connect to database")?,
        );
        let background_repo = Arc::new(OrmRepo::builder().db(db.clone()).build());

        let http_client = Arc::new(
            reqwest::Client::builder().connect_timeout(Duration::from_secs(2)).build()?,
        );
        let collaborators = &config.collaborators;
        let timeout = Duration::from_millis(collaborators.timeout_millis);
        let json_client = |base_url: &str| {
            JsonClient::new(
                http_client.clone(),
                base_url,
                collaborators.max_times,
                timeout,
            )
            .with_context(|| format!("Invalid collaborator url {base_url:?}"))
        };

        let itsm: Arc<dyn ItsmService> = Arc::new(HttpItsmService {
            client: json_client(&collaborators.itsm)?,
        });
        let crp: Arc<dyn CrpService> = Arc::new(HttpCrpService {
            client: json_client(&collaborators.crp)?,
        });
        let catalog: Arc<dyn DeviceCatalogService> =
            Arc::new(HttpDeviceCatalogService::new(json_client(&collaborators.catalog)?));
        let cmdb: Arc<dyn CmdbService> = Arc::new(HttpCmdbService {
            client: json_client(&collaborators.cmdb)?,
        });
        let quota: Arc<dyn QuotaService> = Arc::new(HttpQuotaService {
            client: json_client(&collaborators.quota)?,
        });
        let matcher: Arc<dyn MatcherService> = Arc::new(HttpMatcherService {
            client: json_client(&collaborators.matcher)?,
        });

        let mut generate_service = GenerateServiceImpl::new();
        for (key, url) in collaborators.generators.iter() {
            let resource_type: ResourceType =
                serde_json::from_value(serde_json::Value::String(key.to_owned()))
                    .with_context(|| format!("Unknown resource type {key} in generators"))?;
            generate_service = generate_service.register(
                resource_type,
                Arc::new(HttpGenerator {
                    client: json_client(url)?,
                }),
            );
        }

        let audit = &config.audit;
        let audit_chain = Arc::new(
            AuditChain::new()
                .rule(DeviceCountRule {
                    max_replicas: audit.max_replicas,
                })
                .rule(GreenChannelCoreRule {
                    max_core: audit.green_channel_max_core,
                })
                .rule(PhysicalMachineRule),
        );
        let approval_policies: Vec<Arc<dyn ApprovalPolicy>> = vec![
            Arc::new(HostQuotaPolicy {
                quota: quota.clone(),
            }),
            Arc::new(GreenChannelBudgetPolicy {
                quota,
                core_budget: audit.green_channel_core_budget,
            }),
        ];

        let recover_service: Arc<dyn RecoverService> = Arc::new(
            RecoverServiceImpl::builder()
                .order_repo(background_repo.clone())
                .device_repo(background_repo.clone())
                .generate_record_repo(background_repo.clone())
                .interval(Duration::from_secs(config.recover.interval_secs))
                .timeout(Duration::from_secs(config.recover.timeout_secs))
                .build(),
        );
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            config,
            db,
            background_repo,
            informer: Arc::new(FlumeInformer::new()),
            itsm,
            crp,
            catalog,
            cmdb,
            matcher,
            generate_service: Arc::new(generate_service),
            audit_chain,
            approval_policies,
            recover_service,
            shutdown,
        })
    }

    /// A repository with its own write buffer, one per request.
    pub fn scoped_repo(&self) -> Arc<OrmRepo> {
        Arc::new(OrmRepo::builder().db(self.db.clone()).build())
    }

    fn step_service(&self, repo: Arc<OrmRepo>) -> Arc<dyn ApplyStepService> {
        Arc::new(ApplyStepServiceImpl::builder().step_repo(repo).build())
    }

    pub fn ticket_service(&self) -> Arc<dyn TicketService> {
        let repo = self.scoped_repo();
        let audit = &self.config.audit;
        Arc::new(
            TicketServiceImpl::builder()
                .ticket_repo(repo.clone())
                .order_repo(repo.clone())
                .step_service(self.step_service(repo))
                .itsm(self.itsm.clone())
                .catalog(self.catalog.clone())
                .cmdb(self.cmdb.clone())
                .informer(self.informer.clone())
                .audit_chain(self.audit_chain.clone())
                .approval_policies(self.approval_policies.clone())
                .gpu_min_prepaid_months(audit.gpu_min_prepaid_months)
                .itsm_cancellable_nodes(audit.itsm_cancellable_nodes.clone())
                .build(),
        )
    }

    pub fn order_control_service(&self) -> Arc<dyn OrderControlService> {
        let repo = self.scoped_repo();
        Arc::new(
            OrderControlServiceImpl::builder()
                .order_repo(repo.clone())
                .ticket_repo(repo.clone())
                .modify_record_repo(repo.clone())
                .device_repo(repo.clone())
                .generate_record_repo(repo.clone())
                .step_service(self.step_service(repo))
                .recover_service(self.recover_service.clone())
                .informer(self.informer.clone())
                .catalog(self.catalog.clone())
                .crp(self.crp.clone())
                .matcher(self.matcher.clone())
                .build(),
        )
    }

    pub fn background_services(&self) -> Vec<Arc<dyn BackgroundService>> {
        let repo = self.background_repo.clone();
        let dispatch_service = Arc::new(
            DispatchServiceImpl::builder()
                .order_repo(repo.clone())
                .device_repo(repo.clone())
                .step_service(self.step_service(repo.clone()))
                .generate_service(self.generate_service.clone())
                .build(),
        );
        let dispatcher = Dispatcher::builder()
            .informer(self.informer.clone())
            .dispatch_service(dispatch_service)
            .worker_num(self.config.dispatcher.worker_num)
            .shutdown(self.shutdown.subscribe())
            .build();
        let watcher = ReadyOrderWatcher::builder()
            .order_repo(repo)
            .informer(self.informer.clone())
            .interval(Duration::from_secs(self.config.dispatcher.informer_interval_secs))
            .batch_size(self.config.dispatcher.batch_size)
            .build();
        let services: Vec<Arc<dyn BackgroundService>> =
            vec![Arc::new(dispatcher), Arc::new(watcher)];
        services
    }

    /// Workers finish their current suborder, then stop.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.informer.close();
        tracing::info!(queued = self.informer.len(), "Dispatcher shutting down.");
    }
}
