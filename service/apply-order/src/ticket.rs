use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::{ApplyTicket, TicketItem, TicketStage},
        vo::{
            audit::{ApprovalOutcome, AuditDecision, AuditInfo},
            itsm::{ItsmCreateRequest, ItsmOperateRequest},
            request::{AuditRequest, TicketRequest},
            ChargeType, RequireType,
        },
    },
    repository::{ApplyOrderRepo, ApplyTicketRepo},
    service::{
        ApplyStepService, CmdbService, DeviceCatalogService, InformerService, ItsmService,
        TicketService,
    },
};

use crate::{approval::ApprovalPolicy, audit::AuditChain};

#[derive(typed_builder::TypedBuilder)]
pub struct TicketServiceImpl {
    ticket_repo: Arc<dyn ApplyTicketRepo>,
    order_repo: Arc<dyn ApplyOrderRepo>,
    step_service: Arc<dyn ApplyStepService>,
    itsm: Arc<dyn ItsmService>,
    catalog: Arc<dyn DeviceCatalogService>,
    cmdb: Arc<dyn CmdbService>,
    informer: Arc<dyn InformerService>,
    audit_chain: Arc<AuditChain>,
    #[builder(default)]
    approval_policies: Vec<Arc<dyn ApprovalPolicy>>,
    /// Minimum prepaid months of GPU devices.
    #[builder(default = 1)]
    gpu_min_prepaid_months: u32,
    /// ITSM nodes a requester may still cancel from.
    #[builder(default)]
    itsm_cancellable_nodes: Vec<String>,
}

#[async_trait]
impl TicketService for TicketServiceImpl {
    async fn create_ticket(&self, request: TicketRequest) -> ApplyOrderResult<u64> {
        validate_items(&request.suborders)?;
        if request.suborders.iter().any(|el| el.resource_type.is_upgrade()) {
            return Err(ApplyOrderException::validation(
                "Upgrade items must be applied through the upgrade path.",
            ));
        }
        let order_id = self.ticket_repo.next_order_id().await?;
        let ticket = new_ticket(order_id, TicketStage::Uncommit, request);
        self.ticket_repo.insert(&ticket).await?;
        self.ticket_repo.save_changed().await?;
        tracing::info!(order_id, user = %ticket.user, "Ticket created.");
        Ok(order_id)
    }

    async fn update_ticket(&self, order_id: u64, request: TicketRequest) -> ApplyOrderResult<()> {
        let stored = self.get_ticket(order_id).await?;
        stored.ensure_stage(&[TicketStage::Uncommit])?;
        validate_items(&request.suborders)?;
        let mut ticket = new_ticket(order_id, TicketStage::Uncommit, request);
        ticket.create_at = stored.create_at;
        self.ticket_repo.update_with_guard(&ticket, &[TicketStage::Uncommit]).await?;
        self.ticket_repo.save_changed().await?;
        Ok(())
    }

    async fn create_apply_order(&self, order_id: u64) -> ApplyOrderResult<String> {
        let mut ticket = self.get_ticket(order_id).await?;
        ticket.ensure_stage(&[TicketStage::Uncommit])?;
        if ticket.require_type == RequireType::RollServer {
            self.check_roll_server(&ticket).await?;
        }
        for item in ticket.suborders.iter_mut() {
            let info = self
                .catalog
                .get_device_type_info(&item.spec.device_type)
                .await
                .map_err(|e| ApplyOrderException::external("device catalog", e))?;
            if info.is_gpu
                && (item.spec.charge_type != ChargeType::Prepaid
                    || item.spec.charge_months < self.gpu_min_prepaid_months)
            {
                return Err(ApplyOrderException::validation(format!(
                    "GPU device type {} must be prepaid for at least {} months.",
                    item.spec.device_type, self.gpu_min_prepaid_months
                )));
            }
            item.applied_core = info.cpu_core * item.replicas as u64;
        }

        let decision = self.check_auto_audit(&ticket).await?;
        let itsm_ticket_id = self
            .itsm
            .create_ticket(&ItsmCreateRequest {
                order_id,
                creator: ticket.user.clone(),
                biz_id: ticket.biz_id,
                manual_audit_reason: match &decision {
                    AuditDecision::Auto => String::new(),
                    AuditDecision::Manual { reason } => reason.clone(),
                },
                remark: ticket.remark.clone(),
            })
            .await
            .map_err(|e| ApplyOrderException::external("itsm", e))?;

        ticket.itsm_ticket_id = itsm_ticket_id.clone();
        ticket.stage = TicketStage::Audit;
        ticket.update_at = Utc::now();
        self.ticket_repo.update_with_guard(&ticket, &[TicketStage::Uncommit]).await?;
        if let Err(e) = self.ticket_repo.save_changed().await {
            if let Err(e) = self
                .itsm
                .terminate_ticket(&itsm_ticket_id, &ticket.user, "Submission failed.")
                .await
            {
                tracing::warn!(order_id, %itsm_ticket_id, "Terminate orphan ITSM ticket failed: {e}");
            }
            return Err(e.into());
        }
        tracing::info!(order_id, %itsm_ticket_id, ?decision, "Ticket submitted for audit.");
        Ok(itsm_ticket_id)
    }

    async fn check_auto_audit(&self, ticket: &ApplyTicket) -> ApplyOrderResult<AuditDecision> {
        Ok(self.audit_chain.evaluate(ticket))
    }

    async fn audit_ticket(&self, request: AuditRequest) -> ApplyOrderResult<()> {
        let ticket = self.get_ticket(request.order_id).await?;
        ticket.ensure_stage(&[TicketStage::Audit])?;
        let status = self
            .itsm
            .get_ticket_status(&ticket.itsm_ticket_id)
            .await
            .map_err(|e| ApplyOrderException::external("itsm", e))?;
        let node = status
            .current_nodes
            .iter()
            .find(|el| el.state_id == request.state_id)
            .ok_or(ApplyOrderException::validation(format!(
                "Ticket {} is not waiting on node {}.",
                request.order_id, request.state_id
            )))?;
        if !node.processors.is_empty() && !node.processors.contains(&request.operator) {
            return Err(ApplyOrderException::PermissionDenied {
                user: request.operator,
                action: format!("audit node {}", node.name),
            });
        }
        self.itsm
            .operate_node(&ItsmOperateRequest {
                itsm_ticket_id: ticket.itsm_ticket_id,
                state_id: request.state_id,
                operator: request.operator,
                approval: request.approval,
                remark: request.remark,
            })
            .await
            .map_err(|e| ApplyOrderException::external("itsm", e))?;
        Ok(())
    }

    async fn approve_ticket(
        &self,
        order_id: u64,
        approval: bool,
        reason: &str,
    ) -> ApplyOrderResult<ApprovalOutcome> {
        let ticket = self.get_ticket(order_id).await?;
        ticket.ensure_stage(&[TicketStage::Audit])?;
        if !approval {
            return self.reject(ticket, reason.to_owned()).await;
        }
        for policy in self.approval_policies.iter() {
            if let Some(reason) = policy.check(&ticket).await? {
                return self.reject(ticket, reason).await;
            }
        }

        let res = self.run_approval(ticket).await;
        if res.is_err() {
            self.ticket_repo.discard_changed().await?;
        }
        let suborder_ids = res?;
        self.record_approval(order_id).await;
        self.enqueue(&suborder_ids).await;
        tracing::info!(order_id, suborders = suborder_ids.len(), "Ticket approved.");
        Ok(ApprovalOutcome::Approved { suborder_ids })
    }

    async fn cancel_ticket_itsm(&self, order_id: u64, operator: &str) -> ApplyOrderResult<()> {
        let mut ticket = self.get_ticket(order_id).await?;
        if ticket.user != operator {
            return Err(ApplyOrderException::PermissionDenied {
                user: operator.to_owned(),
                action: format!("cancel ticket {order_id}"),
            });
        }
        let stage = ticket.stage;
        if !stage.can_transition_to(TicketStage::Terminate) || ticket.itsm_ticket_id.is_empty() {
            return Err(ApplyOrderException::InvalidTicketStage {
                order_id,
                stage,
                expected: vec![TicketStage::Audit],
            });
        }
        let status = self
            .itsm
            .get_ticket_status(&ticket.itsm_ticket_id)
            .await
            .map_err(|e| ApplyOrderException::external("itsm", e))?;
        if !status.status.is_cancellable() {
            return Err(ApplyOrderException::ItsmNotCancellable {
                itsm_ticket_id: ticket.itsm_ticket_id,
                reason: format!("ticket is {:?}", status.status),
            });
        }
        if status.current_nodes.is_empty()
            || status
                .current_nodes
                .iter()
                .any(|el| !self.itsm_cancellable_nodes.contains(&el.state_id))
        {
            return Err(ApplyOrderException::ItsmNotCancellable {
                itsm_ticket_id: ticket.itsm_ticket_id,
                reason: "current node does not allow cancellation".to_owned(),
            });
        }

        self.itsm
            .terminate_ticket(&ticket.itsm_ticket_id, operator, "Cancelled by requester.")
            .await
            .map_err(|e| ApplyOrderException::external("itsm", e))?;
        ticket.stage = TicketStage::Terminate;
        ticket.update_at = Utc::now();
        self.ticket_repo.update_with_guard(&ticket, &[stage]).await?;
        self.ticket_repo.save_changed().await?;
        tracing::info!(order_id, operator, "Ticket cancelled in ITSM.");
        Ok(())
    }

    async fn create_upgrade_ticket_and_order(
        &self,
        request: TicketRequest,
    ) -> ApplyOrderResult<ApplyTicket> {
        validate_items(&request.suborders)?;
        if !request.suborders.iter().all(|el| el.resource_type.is_upgrade()) {
            return Err(ApplyOrderException::validation(
                "Every item of an upgrade ticket must be an upgrade.",
            ));
        }
        let order_id = self.ticket_repo.next_order_id().await?;
        let mut ticket = new_ticket(order_id, TicketStage::Running, request);
        for item in ticket.suborders.iter_mut() {
            let info = self
                .catalog
                .get_device_type_info(&item.spec.device_type)
                .await
                .map_err(|e| ApplyOrderException::external("device catalog", e))?;
            item.applied_core = info.cpu_core * item.replicas as u64;
        }

        let res = async {
            self.ticket_repo.insert(&ticket).await?;
            let suborder_ids = self.insert_suborders(&ticket).await?;
            self.ticket_repo.save_changed().await?;
            ApplyOrderResult::Ok(suborder_ids)
        }
        .await;
        if res.is_err() {
            self.ticket_repo.discard_changed().await?;
        }
        let suborder_ids = res?;
        self.enqueue(&suborder_ids).await;
        tracing::info!(order_id, "Upgrade ticket is running.");
        Ok(ticket)
    }

    async fn get_ticket(&self, order_id: u64) -> ApplyOrderResult<ApplyTicket> {
        self.ticket_repo
            .find_by_id(&order_id)
            .await?
            .ok_or(ApplyOrderException::TicketNotFound { order_id })
    }

    async fn get_audit_info(&self, order_id: u64) -> ApplyOrderResult<AuditInfo> {
        let ticket = self.get_ticket(order_id).await?;
        if ticket.itsm_ticket_id.is_empty() {
            return Err(ApplyOrderException::InvalidTicketStage {
                order_id,
                stage: ticket.stage,
                expected: vec![TicketStage::Audit],
            });
        }
        let status = self
            .itsm
            .get_ticket_status(&ticket.itsm_ticket_id)
            .await
            .map_err(|e| ApplyOrderException::external("itsm", e))?;
        let logs = self
            .itsm
            .get_ticket_log(&ticket.itsm_ticket_id)
            .await
            .map_err(|e| ApplyOrderException::external("itsm", e))?;
        Ok(AuditInfo {
            order_id,
            itsm_ticket_id: ticket.itsm_ticket_id,
            status: status.status,
            current_nodes: status.current_nodes,
            logs,
        })
    }
}

impl TicketServiceImpl {
    /// Every item must inherit from a host of the same device group.
    async fn check_roll_server(&self, ticket: &ApplyTicket) -> ApplyOrderResult<()> {
        for item in ticket.suborders.iter() {
            let instance_id = item.spec.inherit_instance_id.as_deref().ok_or(
                ApplyOrderException::validation(
                    "Rolling server items must name the host they inherit from.",
                ),
            )?;
            let host_type = self
                .cmdb
                .get_host_device_type(instance_id)
                .await
                .map_err(|e| ApplyOrderException::external("cmdb", e))?;
            let host = self
                .catalog
                .get_device_type_info(&host_type)
                .await
                .map_err(|e| ApplyOrderException::external("device catalog", e))?;
            let requested = self
                .catalog
                .get_device_type_info(&item.spec.device_type)
                .await
                .map_err(|e| ApplyOrderException::external("device catalog", e))?;
            if host.device_group != requested.device_group {
                return Err(ApplyOrderException::DeviceGroupMismatch {
                    device_type: item.spec.device_type.clone(),
                    expected: host.device_group,
                });
            }
        }
        Ok(())
    }

    /// Buffer the running ticket with its suborders and ledgers, then commit.
    async fn run_approval(&self, mut ticket: ApplyTicket) -> ApplyOrderResult<Vec<String>> {
        ticket.stage = TicketStage::Running;
        ticket.update_at = Utc::now();
        self.ticket_repo.update_with_guard(&ticket, &[TicketStage::Audit]).await?;
        let suborder_ids = self.insert_suborders(&ticket).await?;
        self.ticket_repo.save_changed().await?;
        Ok(suborder_ids)
    }

    /// Reservations are only made for committed approvals. A failure here
    /// leaves the approval in place.
    async fn record_approval(&self, order_id: u64) {
        let ticket = match self.get_ticket(order_id).await {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::error!(order_id, "Cannot reload approved ticket: {e}");
                return;
            }
        };
        for policy in self.approval_policies.iter() {
            if let Err(e) = policy.record(&ticket).await {
                tracing::error!(order_id, "Recording approval failed: {e}");
            }
        }
    }

    async fn insert_suborders(&self, ticket: &ApplyTicket) -> ApplyOrderResult<Vec<String>> {
        let mut suborder_ids = vec![];
        for order in ticket.fan_out(Utc::now()) {
            self.order_repo.insert(&order).await?;
            self.step_service.init_steps(&order).await?;
            suborder_ids.push(order.suborder_id);
        }
        Ok(suborder_ids)
    }

    async fn reject(
        &self,
        mut ticket: ApplyTicket,
        reason: String,
    ) -> ApplyOrderResult<ApprovalOutcome> {
        ticket.stage = TicketStage::Terminate;
        ticket.update_at = Utc::now();
        self.ticket_repo.update_with_guard(&ticket, &[TicketStage::Audit]).await?;
        self.ticket_repo.save_changed().await?;
        tracing::info!(order_id = ticket.order_id, %reason, "Ticket rejected.");
        Ok(ApprovalOutcome::Rejected { reason })
    }

    async fn enqueue(&self, suborder_ids: &[String]) {
        for id in suborder_ids {
            if let Err(e) = self.informer.add(id.clone()).await {
                tracing::warn!(suborder_id = %id, "Enqueue failed, left to the watcher: {e}");
            }
        }
    }
}

fn validate_items(items: &[TicketItem]) -> ApplyOrderResult<()> {
    if items.is_empty() {
        return Err(ApplyOrderException::validation("Ticket has no items."));
    }
    if let Some(item) = items.iter().find(|el| el.replicas == 0) {
        return Err(ApplyOrderException::validation(format!(
            "Item of device type {} applies no devices.",
            item.spec.device_type
        )));
    }
    Ok(())
}

fn new_ticket(order_id: u64, stage: TicketStage, request: TicketRequest) -> ApplyTicket {
    let now = Utc::now();
    ApplyTicket {
        order_id,
        itsm_ticket_id: String::new(),
        stage,
        biz_id: request.biz_id,
        user: request.user,
        follower: request.follower,
        require_type: request.require_type,
        expect_time: request.expect_time,
        remark: request.remark,
        suborders: request.suborders,
        create_at: now,
        update_at: now,
    }
}
