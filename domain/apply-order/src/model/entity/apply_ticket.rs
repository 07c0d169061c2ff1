use chrono::{DateTime, Utc};
use infrastructure_architecture::model::AggregateRoot;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use super::ApplyOrder;
use crate::exception::{ApplyOrderException, ApplyOrderResult};
use crate::model::vo::{RequireType, ResourceSpec, ResourceType};

/// # Apply ticket
/// One requester submission, fanned out into suborders once approved.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplyTicket {
    /// Sequence assigned id.
    pub order_id: u64,
    /// Audit ticket opened in ITSM, empty before submission.
    #[serde(default)]
    pub itsm_ticket_id: String,
    pub stage: TicketStage,
    pub biz_id: i64,
    pub user: String,
    #[serde(default)]
    pub follower: Vec<String>,
    pub require_type: RequireType,
    pub expect_time: DateTime<Utc>,
    #[serde(default)]
    pub remark: String,
    /// Requested items, one suborder each.
    pub suborders: Vec<TicketItem>,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl AggregateRoot for ApplyTicket {
    type Id = u64;
}

/// One requested item of a ticket.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketItem {
    pub resource_type: ResourceType,
    pub spec: ResourceSpec,
    pub replicas: u32,
    #[serde(default)]
    pub anti_affinity_level: String,
    #[serde(default)]
    pub enable_disk_check: bool,
    #[serde(default)]
    pub remark: String,
    /// Cpu cores of all replicas, filled from the device catalog on submission.
    #[serde(default)]
    pub applied_core: u64,
}

/// Lifecycle stage shared by tickets and suborders.
#[derive(
    FromPrimitive, ToPrimitive, Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStage {
    /// # Uncommitted
    /// Draft, still editable by the requester.
    #[default]
    Uncommit,
    /// # Auditing
    /// Submitted to ITSM and waiting for approval.
    Audit,
    /// # Running
    /// Approved, suborders are being produced.
    Running,
    /// # Suspended
    /// Paused by an operator or by a production failure.
    Suspend,
    /// # Done
    Done,
    /// # Terminated
    Terminate,
}

impl TicketStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Terminate)
    }

    /// Whether the lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(&self, to: TicketStage) -> bool {
        use TicketStage::*;
        match (self, to) {
            (from, Terminate) => !from.is_terminal(),
            (Uncommit, Audit) | (Audit, Running) => true,
            (Running, Suspend) | (Suspend, Running) | (Running, Done) => true,
            _ => false,
        }
    }
}

impl ApplyTicket {
    /// Fails unless the ticket is in one of `expected` stages.
    pub fn ensure_stage(&self, expected: &[TicketStage]) -> ApplyOrderResult<()> {
        if expected.contains(&self.stage) {
            return Ok(());
        }
        Err(ApplyOrderException::InvalidTicketStage {
            order_id: self.order_id,
            stage: self.stage,
            expected: expected.to_vec(),
        })
    }

    /// Whether every item is an in-place upgrade.
    pub fn is_upgrade(&self) -> bool {
        !self.suborders.is_empty() && self.suborders.iter().all(|el| el.resource_type.is_upgrade())
    }

    pub fn total_replicas(&self) -> u32 {
        self.suborders.iter().map(|el| el.replicas).sum()
    }

    pub fn total_applied_core(&self) -> u64 {
        self.suborders.iter().map(|el| el.applied_core).sum()
    }

    pub fn has_physical_machine(&self) -> bool {
        self.suborders.iter().any(|el| el.resource_type.is_physical())
    }

    /// Split the ticket into suborders, one per requested item.
    pub fn fan_out(&self, now: DateTime<Utc>) -> Vec<ApplyOrder> {
        self.suborders
            .iter()
            .enumerate()
            .map(|(i, item)| ApplyOrder::from_item(self, i + 1, item, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(resource_type: ResourceType, replicas: u32) -> TicketItem {
        TicketItem {
            resource_type,
            replicas,
            applied_core: replicas as u64 * 8,
            ..Default::default()
        }
    }

    #[test]
    fn stage_transitions() {
        use TicketStage::*;
        assert!(Uncommit.can_transition_to(Audit));
        assert!(Audit.can_transition_to(Running));
        assert!(Running.can_transition_to(Suspend));
        assert!(Suspend.can_transition_to(Running));
        assert!(Audit.can_transition_to(Terminate));
        assert!(!Audit.can_transition_to(Suspend));
        assert!(!Uncommit.can_transition_to(Running));
        assert!(!Done.can_transition_to(Terminate));
        assert!(!Terminate.can_transition_to(Running));
    }

    #[test]
    fn fan_out_assigns_deterministic_ids() {
        let ticket = ApplyTicket {
            order_id: 1001,
            stage: TicketStage::Running,
            suborders: vec![item(ResourceType::QCloudCvm, 3), item(ResourceType::IdcPm, 2)],
            ..Default::default()
        };
        let orders = ticket.fan_out(Utc::now());
        let ids = orders.iter().map(|el| el.suborder_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["1001-1", "1001-2"]);
        assert_eq!(orders[1].origin_num, 2);
        assert_eq!(orders[1].applied_core, 16);
        assert!(ticket.has_physical_machine());
        assert_eq!(ticket.total_replicas(), 5);
        assert!(!ticket.is_upgrade());
    }
}
