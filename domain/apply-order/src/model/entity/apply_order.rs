use chrono::{DateTime, Utc};
use infrastructure_architecture::model::AggregateRoot;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use super::{ApplyTicket, ModifySnapshot, TicketItem, TicketStage};
use crate::exception::{ApplyOrderException, ApplyOrderResult};
use crate::model::vo::{RequireType, ResourceSpec, ResourceType};

/// # Suborder
/// Produced 1:1 from a ticket item on approval, the unit the dispatcher works on.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOrder {
    pub order_id: u64,
    /// `"{order_id}-{index}"`, dispatch key.
    pub suborder_id: String,
    pub biz_id: i64,
    pub user: String,
    pub require_type: RequireType,
    pub resource_type: ResourceType,
    pub stage: TicketStage,
    pub status: ApplyStatus,
    /// Replicas requested in the ticket, never changes.
    pub origin_num: u32,
    /// Replicas the suborder currently aims for.
    pub total_num: u32,
    /// Replicas still waiting to be produced.
    pub pending_num: u32,
    /// Replicas delivered.
    pub success_num: u32,
    /// Cpu cores granted on submission.
    pub applied_core: u64,
    /// Cpu cores of the delivered devices.
    pub delivered_core: u64,
    /// Dispatch attempts since the last start or modification.
    pub retry_time: u32,
    pub modify_time: u32,
    pub enable_disk_check: bool,
    pub anti_affinity_level: String,
    pub remark: String,
    pub spec: ResourceSpec,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl AggregateRoot for ApplyOrder {
    type Id = String;
}

/// Production status of a suborder.
#[derive(
    FromPrimitive, ToPrimitive, Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyStatus {
    /// Waiting for a dispatcher worker.
    #[default]
    WaitForMatch,
    /// Locked by exactly one dispatch attempt.
    Matching,
    /// Some devices delivered, more to come.
    MatchedSome,
    Done,
    Terminate,
    /// Terminating while outstanding CRP tasks are revoked.
    GracefulTerminate,
}

impl ApplyStatus {
    pub fn is_dispatchable(&self) -> bool {
        !matches!(
            self,
            Self::Done | Self::Matching | Self::Terminate | Self::GracefulTerminate
        )
    }
}

impl ApplyOrder {
    /// Max dispatch attempts before the suborder is suspended for good.
    pub const MAX_RETRY_TIME: u32 = 3;

    pub fn suborder_id_of(order_id: u64, index: usize) -> String {
        format!("{order_id}-{index}")
    }

    /// Build the suborder of the `index`-th (1-based) item of `ticket`.
    pub fn from_item(
        ticket: &ApplyTicket,
        index: usize,
        item: &TicketItem,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: ticket.order_id,
            suborder_id: Self::suborder_id_of(ticket.order_id, index),
            biz_id: ticket.biz_id,
            user: ticket.user.clone(),
            require_type: ticket.require_type,
            resource_type: item.resource_type,
            stage: ticket.stage,
            status: ApplyStatus::WaitForMatch,
            origin_num: item.replicas,
            total_num: item.replicas,
            pending_num: item.replicas,
            success_num: 0,
            applied_core: item.applied_core,
            delivered_core: 0,
            retry_time: 0,
            modify_time: 0,
            enable_disk_check: item.enable_disk_check,
            anti_affinity_level: item.anti_affinity_level.clone(),
            remark: item.remark.clone(),
            spec: item.spec.clone(),
            create_at: now,
            update_at: now,
        }
    }

    /// Whether a dispatcher worker may pick the suborder up.
    pub fn is_dispatchable(&self) -> bool {
        self.stage == TicketStage::Running && self.status.is_dispatchable()
    }

    pub fn is_retry_exhausted(&self) -> bool {
        self.retry_time > Self::MAX_RETRY_TIME
    }

    pub fn is_finished(&self) -> bool {
        self.success_num >= self.total_num
    }

    /// `pending_num + success_num <= total_num <= origin_num`
    pub fn counts_conserved(&self) -> bool {
        self.pending_num + self.success_num <= self.total_num && self.total_num <= self.origin_num
    }

    pub fn ensure_stage(&self, expected: &[TicketStage]) -> ApplyOrderResult<()> {
        if expected.contains(&self.stage) {
            return Ok(());
        }
        Err(ApplyOrderException::InvalidOrderStage {
            suborder_id: self.suborder_id.clone(),
            stage: self.stage,
            expected: expected.to_vec(),
        })
    }

    pub fn ensure_status(&self, expected: &[ApplyStatus]) -> ApplyOrderResult<()> {
        if expected.contains(&self.status) {
            return Ok(());
        }
        Err(ApplyOrderException::InvalidOrderStatus {
            suborder_id: self.suborder_id.clone(),
            status: self.status,
            expected: expected.to_vec(),
        })
    }

    pub fn snapshot(&self) -> ModifySnapshot {
        ModifySnapshot {
            total_num: self.total_num,
            pending_num: self.pending_num,
            success_num: self.success_num,
            spec: self.spec.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatchable_statuses() {
        assert!(ApplyStatus::WaitForMatch.is_dispatchable());
        assert!(ApplyStatus::MatchedSome.is_dispatchable());
        assert!(!ApplyStatus::Matching.is_dispatchable());
        assert!(!ApplyStatus::Done.is_dispatchable());
        assert!(!ApplyStatus::Terminate.is_dispatchable());
        assert!(!ApplyStatus::GracefulTerminate.is_dispatchable());
    }

    #[test]
    fn dispatchable_requires_running_stage() {
        let mut order = ApplyOrder {
            stage: TicketStage::Suspend,
            ..Default::default()
        };
        assert!(!order.is_dispatchable());
        order.stage = TicketStage::Running;
        assert!(order.is_dispatchable());
    }

    #[test]
    fn retry_budget() {
        let mut order = ApplyOrder {
            retry_time: 3,
            ..Default::default()
        };
        assert!(!order.is_retry_exhausted());
        order.retry_time = 4;
        assert!(order.is_retry_exhausted());
    }

    #[test]
    fn count_conservation() {
        let mut order = ApplyOrder {
            origin_num: 5,
            total_num: 5,
            pending_num: 3,
            success_num: 2,
            ..Default::default()
        };
        assert!(order.counts_conserved());
        order.pending_num = 4;
        assert!(!order.counts_conserved());
    }

    #[test]
    fn ensure_stage_reports_expected() {
        let order = ApplyOrder {
            suborder_id: "7-1".into(),
            stage: TicketStage::Running,
            ..Default::default()
        };
        assert!(order.ensure_stage(&[TicketStage::Running]).is_ok());
        let err = order.ensure_stage(&[TicketStage::Suspend]).unwrap_err();
        assert!(matches!(err, ApplyOrderException::InvalidOrderStage { .. }));
    }
}
