use chrono::Utc;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::{ApplyOrder, ApplyStatus, ModifyRecord, ModifySnapshot, TicketStage},
        vo::{
            request::ModifyRequest, CounterUpdate, OrderFilter, OrderUpdate, RecoverHandle,
            ResourceSpec,
        },
    },
};

use super::OrderControlServiceImpl;
use crate::recover::spawn_recover;

impl OrderControlServiceImpl {
    pub(super) async fn modify_order(
        &self,
        request: ModifyRequest,
    ) -> ApplyOrderResult<RecoverHandle> {
        let order = self.get_order(&request.suborder_id).await?;
        if order.resource_type.is_upgrade() {
            return Err(ApplyOrderException::UpgradeNotModifiable {
                suborder_id: order.suborder_id,
            });
        }
        order.ensure_stage(&[TicketStage::Suspend])?;
        let total_num = self.validate_modification(&order, &request).await?;

        let spec = modified_spec(&order.spec, request.spec);
        let pre_data = order.snapshot();
        let cur_data = ModifySnapshot {
            total_num,
            pending_num: request.replicas,
            success_num: order.success_num,
            spec,
        };

        let res = async {
            self.step_service.restart_failed_steps(&order.suborder_id).await?;
            self.order_repo
                .update_with_filter(
                    &OrderFilter::by_id(&order.suborder_id).with_stages(&[TicketStage::Suspend]),
                    &OrderUpdate {
                        retry_time: Some(CounterUpdate::Set(0)),
                        modify_time: Some(CounterUpdate::Increment),
                        total_num: Some(cur_data.total_num),
                        pending_num: Some(cur_data.pending_num),
                        spec: Some(cur_data.spec.clone()),
                        ..OrderUpdate::stage_status(TicketStage::Running, ApplyStatus::WaitForMatch)
                    },
                )
                .await?;
            let record = ModifyRecord {
                id: self.modify_record_repo.next_record_id().await?,
                order_id: order.order_id,
                suborder_id: order.suborder_id.clone(),
                operator: request.operator.clone(),
                pre_data,
                cur_data,
                create_at: Utc::now(),
            };
            self.modify_record_repo.insert(&record).await?;
            self.order_repo.save_changed().await?;
            ApplyOrderResult::Ok(record.id)
        }
        .await;
        let record_id = self.discard_on_error(res).await?;

        tracing::info!(
            suborder_id = %order.suborder_id,
            operator = %request.operator,
            record_id,
            "Suborder modified."
        );
        self.enqueue(&order.suborder_id).await;
        Ok(spawn_recover(self.recover_service.clone(), order.suborder_id))
    }

    async fn validate_modification(
        &self,
        order: &ApplyOrder,
        request: &ModifyRequest,
    ) -> ApplyOrderResult<u32> {
        let total_num = order
            .success_num
            .checked_add(request.replicas)
            .filter(|num| request.replicas > 0 && *num <= order.origin_num)
            .ok_or_else(|| ApplyOrderException::InvalidReplicas {
                suborder_id: order.suborder_id.clone(),
                replicas: request.replicas,
                success_num: order.success_num,
                origin_num: order.origin_num,
            })?;

        let current = self
            .catalog
            .get_device_type_info(&order.spec.device_type)
            .await
            .map_err(|e| ApplyOrderException::external("device catalog", e))?;
        let requested = self
            .catalog
            .get_device_type_info(&request.spec.device_type)
            .await
            .map_err(|e| ApplyOrderException::external("device catalog", e))?;

        let required = requested
            .cpu_core
            .checked_mul(request.replicas as u64)
            .and_then(|cores| cores.checked_add(order.delivered_core))
            .unwrap_or(u64::MAX);
        if required > order.applied_core {
            return Err(ApplyOrderException::CoreExceeded {
                suborder_id: order.suborder_id.clone(),
                required,
                applied: order.applied_core,
            });
        }
        if requested.device_group != current.device_group {
            return Err(ApplyOrderException::DeviceGroupMismatch {
                device_type: request.spec.device_type.clone(),
                expected: current.device_group,
            });
        }
        if requested.core_size != current.core_size {
            return Err(ApplyOrderException::DeviceSizeMismatch {
                device_type: request.spec.device_type.clone(),
                expected: current.core_size,
            });
        }
        if request.spec.region != order.spec.region {
            return Err(ApplyOrderException::RegionImmutable {
                suborder_id: order.suborder_id.clone(),
                from: order.spec.region.clone(),
                to: request.spec.region.clone(),
            });
        }
        Ok(total_num)
    }
}

/// Placement and device fields come from the request, the rest is kept.
/// Failed zones are forgotten.
fn modified_spec(current: &ResourceSpec, requested: ResourceSpec) -> ResourceSpec {
    ResourceSpec {
        region: current.region.clone(),
        charge_type: current.charge_type,
        charge_months: current.charge_months,
        inherit_instance_id: current.inherit_instance_id.clone(),
        failed_zone_ids: vec![],
        ..requested
    }
}
