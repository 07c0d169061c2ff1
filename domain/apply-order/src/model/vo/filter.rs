use chrono::{DateTime, Utc};

use crate::model::entity::{ApplyOrder, ApplyStatus, ApplyStep, StepName, StepStatus, TicketStage};
use crate::model::vo::ResourceSpec;

/// Conditions a suborder must meet for a targeted update to apply.
///
/// Empty lists put no constraint on the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub suborder_id: String,
    pub stages: Vec<TicketStage>,
    pub statuses: Vec<ApplyStatus>,
    pub excluded_statuses: Vec<ApplyStatus>,
    /// Upper bound of `retry_time`, inclusive.
    pub max_retry_time: Option<u32>,
    /// Exact `success_num` the row must still carry.
    pub success_num: Option<u32>,
}

impl OrderFilter {
    pub fn by_id(suborder_id: impl Into<String>) -> Self {
        Self {
            suborder_id: suborder_id.into(),
            ..Default::default()
        }
    }

    pub fn with_stages(mut self, stages: &[TicketStage]) -> Self {
        self.stages = stages.to_vec();
        self
    }

    pub fn with_statuses(mut self, statuses: &[ApplyStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn excluding_statuses(mut self, statuses: &[ApplyStatus]) -> Self {
        self.excluded_statuses = statuses.to_vec();
        self
    }

    pub fn with_max_retry_time(mut self, max_retry_time: u32) -> Self {
        self.max_retry_time = Some(max_retry_time);
        self
    }

    pub fn with_success_num(mut self, success_num: u32) -> Self {
        self.success_num = Some(success_num);
        self
    }

    pub fn matches(&self, order: &ApplyOrder) -> bool {
        order.suborder_id == self.suborder_id
            && (self.stages.is_empty() || self.stages.contains(&order.stage))
            && (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && !self.excluded_statuses.contains(&order.status)
            && self.max_retry_time.map_or(true, |max| order.retry_time <= max)
            && self.success_num.map_or(true, |num| order.success_num == num)
    }
}

/// How a counter column changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterUpdate {
    Set(u32),
    /// Evaluated by the store against the current value.
    Increment,
}

impl CounterUpdate {
    pub fn apply(&self, current: u32) -> u32 {
        match self {
            Self::Set(v) => *v,
            Self::Increment => current.saturating_add(1),
        }
    }
}

/// Fields of a targeted suborder update, `None` leaves the column untouched.
/// `update_at` is always stamped by the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderUpdate {
    pub stage: Option<TicketStage>,
    pub status: Option<ApplyStatus>,
    pub retry_time: Option<CounterUpdate>,
    pub modify_time: Option<CounterUpdate>,
    pub total_num: Option<u32>,
    pub pending_num: Option<u32>,
    pub success_num: Option<u32>,
    pub delivered_core: Option<u64>,
    pub spec: Option<ResourceSpec>,
}

impl OrderUpdate {
    pub fn stage_status(stage: TicketStage, status: ApplyStatus) -> Self {
        Self {
            stage: Some(stage),
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, order: &mut ApplyOrder, now: DateTime<Utc>) {
        if let Some(stage) = self.stage {
            order.stage = stage;
        }
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(retry_time) = self.retry_time {
            order.retry_time = retry_time.apply(order.retry_time);
        }
        if let Some(modify_time) = self.modify_time {
            order.modify_time = modify_time.apply(order.modify_time);
        }
        if let Some(total_num) = self.total_num {
            order.total_num = total_num;
        }
        if let Some(pending_num) = self.pending_num {
            order.pending_num = pending_num;
        }
        if let Some(success_num) = self.success_num {
            order.success_num = success_num;
        }
        if let Some(delivered_core) = self.delivered_core {
            order.delivered_core = delivered_core;
        }
        if let Some(spec) = &self.spec {
            order.spec = spec.clone();
        }
        order.update_at = now;
    }
}

/// Conditions of a targeted step update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFilter {
    pub suborder_id: String,
    pub step_name: StepName,
    /// Empty accepts any status.
    pub statuses: Vec<StepStatus>,
}

impl StepFilter {
    pub fn new(suborder_id: impl Into<String>, step_name: StepName) -> Self {
        Self {
            suborder_id: suborder_id.into(),
            step_name,
            statuses: vec![],
        }
    }

    pub fn with_statuses(mut self, statuses: &[StepStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn matches(&self, step: &ApplyStep) -> bool {
        step.suborder_id == self.suborder_id
            && step.step_name == self.step_name
            && (self.statuses.is_empty() || self.statuses.contains(&step.status))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepUpdate {
    pub status: Option<StepStatus>,
    pub message: Option<String>,
    pub total_num: Option<u32>,
    pub success_num: Option<u32>,
    pub failed_num: Option<u32>,
    pub running_num: Option<u32>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl StepUpdate {
    pub fn status(status: StepStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, step: &mut ApplyStep) {
        if let Some(status) = self.status {
            step.status = status;
        }
        if let Some(message) = &self.message {
            step.message = message.clone();
        }
        if let Some(total_num) = self.total_num {
            step.total_num = total_num;
        }
        if let Some(success_num) = self.success_num {
            step.success_num = success_num;
        }
        if let Some(failed_num) = self.failed_num {
            step.failed_num = failed_num;
        }
        if let Some(running_num) = self.running_num {
            step.running_num = running_num;
        }
        if self.start_at.is_some() {
            step.start_at = self.start_at;
        }
        if self.end_at.is_some() {
            step.end_at = self.end_at;
        }
    }
}

/// Result of a conditional update. Zero matched rows is a normal race outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    Unmatched,
}

impl UpdateOutcome {
    pub fn from_rows(rows_affected: u64) -> Self {
        if rows_affected > 0 {
            Self::Applied
        } else {
            Self::Unmatched
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
