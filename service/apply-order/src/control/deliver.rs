use std::collections::HashMap;

use chrono::Utc;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::{ApplyOrder, ApplyStatus, DeviceInfo, StepName, TicketStage},
        vo::{OrderFilter, OrderUpdate},
    },
};
use uuid::Uuid;

use super::OrderControlServiceImpl;

const MAX_DELIVERY_ATTEMPTS: usize = 8;

impl OrderControlServiceImpl {
    pub(super) async fn deliver(
        &self,
        suborder_id: &str,
        device_ids: &[Uuid],
    ) -> ApplyOrderResult<ApplyOrder> {
        let order = self.get_order(suborder_id).await?;
        order.ensure_stage(&[TicketStage::Running])?;
        let devices = self.deliverable_devices(&order, device_ids).await?;

        self.matcher
            .process_init_step(&order, &devices)
            .await
            .map_err(|e| ApplyOrderException::external("matcher", e))?;
        self.matcher
            .deliver_devices(&order, &devices)
            .await
            .map_err(|e| ApplyOrderException::external("matcher", e))?;
        self.matcher
            .set_device_delivered(device_ids)
            .await
            .map_err(|e| ApplyOrderException::external("matcher", e))?;

        let cores = self.cores_of(&devices).await?;
        let delivered = devices.len() as u32;
        let order = self.record_delivery(suborder_id, delivered, cores).await?;
        let finished = order.stage == TicketStage::Done;
        self.step_service
            .update_progress(suborder_id, StepName::Init, order.success_num, order.total_num)
            .await?;
        self.step_service
            .update_progress(suborder_id, StepName::Deliver, order.success_num, order.total_num)
            .await?;
        tracing::info!(
            suborder_id,
            delivered,
            success_num = order.success_num,
            total_num = order.total_num,
            "Devices delivered."
        );

        if finished {
            self.matcher
                .final_apply_step(&order)
                .await
                .map_err(|e| ApplyOrderException::external("matcher", e))?;
            self.finish_ticket(order.order_id).await?;
        }
        self.get_order(suborder_id).await
    }

    /// Adds the delivered devices to the counters of the current row.
    ///
    /// The write is guarded by the `success_num` it was computed from, a
    /// concurrent delivery makes it re-read and recompute.
    async fn record_delivery(
        &self,
        suborder_id: &str,
        delivered: u32,
        cores: u64,
    ) -> ApplyOrderResult<ApplyOrder> {
        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            let mut order = self.get_order(suborder_id).await?;
            order.ensure_stage(&[TicketStage::Running])?;
            let success_num = order
                .success_num
                .checked_add(delivered)
                .filter(|num| *num <= order.total_num)
                .ok_or_else(|| {
                    ApplyOrderException::validation(format!(
                        "Suborder {suborder_id} has {} of {} devices, {delivered} more given.",
                        order.success_num, order.total_num
                    ))
                })?;
            let finished = success_num >= order.total_num;
            let update = OrderUpdate {
                stage: finished.then_some(TicketStage::Done),
                status: Some(if finished {
                    ApplyStatus::Done
                } else {
                    ApplyStatus::MatchedSome
                }),
                success_num: Some(success_num),
                pending_num: Some(order.pending_num.saturating_sub(delivered)),
                delivered_core: Some(order.delivered_core.saturating_add(cores)),
                ..Default::default()
            };
            let outcome = self
                .order_repo
                .update_immediately_with_filter(
                    &OrderFilter::by_id(suborder_id)
                        .with_stages(&[TicketStage::Running])
                        .with_success_num(order.success_num),
                    &update,
                )
                .await?;
            if outcome.is_applied() {
                update.apply_to(&mut order, Utc::now());
                return Ok(order);
            }
            tracing::debug!(suborder_id, "Suborder changed while recording delivery, retrying.");
        }
        Err(anyhow::anyhow!(
            "Suborder {suborder_id} kept changing while recording delivery."
        )
        .into())
    }

    pub(super) async fn disk_check(&self, suborder_id: &str) -> ApplyOrderResult<()> {
        let order = self.get_order(suborder_id).await?;
        if !order.enable_disk_check {
            return Err(ApplyOrderException::validation(format!(
                "Disk check is not enabled for suborder {suborder_id}."
            )));
        }
        order.ensure_stage(&[TicketStage::Running])?;

        self.step_service.start_step(suborder_id, StepName::DiskCheck).await?;
        match self.matcher.run_disk_check(&order).await {
            Ok(()) => {
                self.step_service
                    .update_progress(
                        suborder_id,
                        StepName::DiskCheck,
                        order.total_num,
                        order.total_num,
                    )
                    .await?;
                tracing::info!(suborder_id, "Disk check passed.");
                Ok(())
            }
            Err(e) => {
                self.step_service
                    .fail_step(suborder_id, StepName::DiskCheck, &e.to_string())
                    .await?;
                Err(ApplyOrderException::external("matcher", e))
            }
        }
    }

    async fn deliverable_devices(
        &self,
        order: &ApplyOrder,
        device_ids: &[Uuid],
    ) -> ApplyOrderResult<Vec<DeviceInfo>> {
        if device_ids.is_empty() {
            return Err(ApplyOrderException::validation("No device given."));
        }
        let devices = self.device_repo.get_by_ids(device_ids).await?;
        for id in device_ids {
            let Some(device) = devices.iter().find(|el| el.id == *id) else {
                return Err(ApplyOrderException::validation(format!("Unknown device {id}.")));
            };
            if device.suborder_id != order.suborder_id {
                return Err(ApplyOrderException::validation(format!(
                    "Device {id} belongs to suborder {}.",
                    device.suborder_id
                )));
            }
            if device.is_released || device.is_delivered {
                return Err(ApplyOrderException::validation(format!(
                    "Device {id} is released or already delivered."
                )));
            }
        }
        if order.success_num.saturating_add(devices.len() as u32) > order.total_num {
            return Err(ApplyOrderException::validation(format!(
                "Suborder {} needs {} more devices, {} given.",
                order.suborder_id,
                order.total_num - order.success_num.min(order.total_num),
                devices.len()
            )));
        }
        Ok(devices)
    }

    async fn cores_of(&self, devices: &[DeviceInfo]) -> ApplyOrderResult<u64> {
        let mut per_type = HashMap::new();
        let mut cores = 0;
        for device in devices {
            if !per_type.contains_key(&device.device_type) {
                let info = self
                    .catalog
                    .get_device_type_info(&device.device_type)
                    .await
                    .map_err(|e| ApplyOrderException::external("device catalog", e))?;
                per_type.insert(device.device_type.clone(), info.cpu_core);
            }
            cores += per_type[&device.device_type];
        }
        Ok(cores)
    }

    /// The ticket is done once every suborder ended and at least one delivered.
    async fn finish_ticket(&self, order_id: u64) -> ApplyOrderResult<()> {
        let siblings = self.order_repo.get_by_order_id(order_id).await?;
        let all_ended = siblings.iter().all(|el| el.stage.is_terminal());
        let any_done = siblings.iter().any(|el| el.stage == TicketStage::Done);
        if !(all_ended && any_done) {
            return Ok(());
        }
        let Some(mut ticket) = self.ticket_repo.find_by_id(&order_id).await? else {
            return Err(ApplyOrderException::TicketNotFound { order_id });
        };
        if ticket.stage != TicketStage::Running {
            return Ok(());
        }
        ticket.stage = TicketStage::Done;
        ticket.update_at = Utc::now();
        let res = async {
            self.ticket_repo
                .update_with_guard(&ticket, &[TicketStage::Running])
                .await?;
            self.ticket_repo.save_changed().await?;
            ApplyOrderResult::Ok(())
        }
        .await;
        self.discard_on_error(res).await?;
        tracing::info!(order_id, "Ticket done.");
        Ok(())
    }
}
