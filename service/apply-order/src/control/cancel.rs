use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::ApplyStatus,
        vo::{OrderFilter, OrderUpdate},
    },
};

use super::OrderControlServiceImpl;

const CANCELLABLE: [ApplyStatus; 3] = [
    ApplyStatus::Matching,
    ApplyStatus::MatchedSome,
    ApplyStatus::GracefulTerminate,
];

impl OrderControlServiceImpl {
    pub(super) async fn cancel_crp_tasks(&self, suborder_id: &str) -> ApplyOrderResult<()> {
        let order = self.get_order(suborder_id).await?;
        order.ensure_status(&CANCELLABLE)?;

        let records = self.generate_record_repo.get_by_suborder_id(suborder_id).await?;
        if let Some(record) = records.iter().find(|el| !el.has_task()) {
            return Err(ApplyOrderException::GenerationNotReady {
                suborder_id: suborder_id.to_owned(),
                generate_id: record.generate_id,
            });
        }

        let outcome = self
            .order_repo
            .update_immediately_with_filter(
                &OrderFilter::by_id(suborder_id).with_statuses(&CANCELLABLE),
                &OrderUpdate {
                    status: Some(ApplyStatus::GracefulTerminate),
                    ..Default::default()
                },
            )
            .await?;
        if !outcome.is_applied() {
            let current = self.get_order(suborder_id).await?;
            return Err(ApplyOrderException::InvalidOrderStatus {
                suborder_id: suborder_id.to_owned(),
                status: current.status,
                expected: CANCELLABLE.to_vec(),
            });
        }
        tracing::info!(suborder_id, "Suborder gracefully terminating.");

        let task_ids = records
            .iter()
            .filter(|el| !el.is_finished())
            .map(|el| el.task_id.clone())
            .collect::<Vec<_>>();
        if task_ids.is_empty() {
            return Ok(());
        }
        let crp_orders = self
            .crp
            .query_orders(&task_ids)
            .await
            .map_err(|e| ApplyOrderException::external("crp", e))?;

        let mut failures = vec![];
        for crp_order in crp_orders.iter().filter(|el| el.should_revoke()) {
            if let Err(e) = self.crp.revoke_order(&crp_order.task_id).await {
                tracing::warn!(suborder_id, task_id = %crp_order.task_id, "Revoke failed: {e}");
                failures.push(format!("{}: {e}", crp_order.task_id));
            }
        }
        if !failures.is_empty() {
            return Err(ApplyOrderException::RevokeFailed { failures });
        }
        Ok(())
    }
}
