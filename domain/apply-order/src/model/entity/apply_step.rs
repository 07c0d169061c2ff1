use chrono::{DateTime, Utc};
use infrastructure_architecture::model::AggregateRoot;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use super::ApplyOrder;

/// Progress of one production stage of a suborder.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStep {
    pub suborder_id: String,
    pub order_id: u64,
    /// Ordinal of `step_name`.
    pub step_id: i32,
    pub step_name: StepName,
    pub status: StepStatus,
    pub message: String,
    pub total_num: u32,
    pub success_num: u32,
    pub failed_num: u32,
    pub running_num: u32,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl AggregateRoot for ApplyStep {
    type Id = (String, StepName);
}

#[derive(
    FromPrimitive,
    ToPrimitive,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Debug,
    Default,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepName {
    #[default]
    Commit = 1,
    Generate = 2,
    Init = 3,
    DiskCheck = 4,
    Deliver = 5,
}

impl StepName {
    pub fn ordinal(&self) -> i32 {
        *self as i32
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Commit => "commit",
            Self::Generate => "generate",
            Self::Init => "init",
            Self::DiskCheck => "disk_check",
            Self::Deliver => "deliver",
        };
        f.write_str(name)
    }
}

#[derive(
    FromPrimitive, ToPrimitive, Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    #[default]
    Init,
    Handling,
    Success,
    Failed,
}

impl StepStatus {
    pub const ALL: [StepStatus; 4] = [Self::Init, Self::Handling, Self::Success, Self::Failed];

    /// `Failed -> Handling` is reserved to explicit recovery and is rejected here.
    pub fn can_transition_to(&self, to: StepStatus) -> bool {
        use StepStatus::*;
        matches!(
            (self, to),
            (Init, Handling) | (Handling, Success) | (Handling, Failed) | (Init, Failed)
        )
    }

    /// Whether recovery may restart a step in this status.
    pub fn is_restartable(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Statuses a step may leave for `to` through a regular transition.
    pub fn sources_of(to: StepStatus) -> Vec<StepStatus> {
        Self::ALL.into_iter().filter(|el| el.can_transition_to(to)).collect()
    }

    /// Statuses recovery moves back to `Handling`.
    pub fn restartable() -> Vec<StepStatus> {
        Self::ALL.into_iter().filter(|el| el.is_restartable()).collect()
    }
}

impl ApplyStep {
    pub fn new(order: &ApplyOrder, step_name: StepName, status: StepStatus, now: DateTime<Utc>) -> Self {
        let finished = matches!(status, StepStatus::Success | StepStatus::Failed);
        Self {
            suborder_id: order.suborder_id.clone(),
            order_id: order.order_id,
            step_id: step_name.ordinal(),
            step_name,
            status,
            message: String::new(),
            total_num: order.total_num,
            success_num: if status == StepStatus::Success { order.total_num } else { 0 },
            failed_num: 0,
            running_num: 0,
            start_at: (status != StepStatus::Init).then_some(now),
            end_at: finished.then_some(now),
        }
    }

    /// Ledger of a freshly created suborder, in ordinal order.
    ///
    /// Commit is already done, the rest wait. DiskCheck only exists when the
    /// suborder asks for it.
    pub fn ledger_for(order: &ApplyOrder, now: DateTime<Utc>) -> Vec<ApplyStep> {
        let mut steps = vec![
            Self::new(order, StepName::Commit, StepStatus::Success, now),
            Self::new(order, StepName::Generate, StepStatus::Init, now),
            Self::new(order, StepName::Init, StepStatus::Init, now),
        ];
        if order.enable_disk_check {
            steps.push(Self::new(order, StepName::DiskCheck, StepStatus::Init, now));
        }
        steps.push(Self::new(order, StepName::Deliver, StepStatus::Init, now));
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_order_and_disk_check() {
        let mut order = ApplyOrder {
            suborder_id: "9-1".into(),
            order_id: 9,
            total_num: 4,
            ..Default::default()
        };
        let now = Utc::now();
        let names = |steps: Vec<ApplyStep>| steps.into_iter().map(|el| el.step_name).collect::<Vec<_>>();

        assert_eq!(
            names(ApplyStep::ledger_for(&order, now)),
            [StepName::Commit, StepName::Generate, StepName::Init, StepName::Deliver]
        );
        order.enable_disk_check = true;
        let steps = ApplyStep::ledger_for(&order, now);
        assert!(steps.windows(2).all(|w| w[0].step_id < w[1].step_id));
        assert_eq!(steps[0].status, StepStatus::Success);
        assert_eq!(steps[0].success_num, 4);
        assert!(steps[1..].iter().all(|el| el.status == StepStatus::Init));
        assert_eq!(names(steps)[3], StepName::DiskCheck);
    }

    #[test]
    fn failed_step_is_not_restarted_automatically() {
        assert!(StepStatus::Init.can_transition_to(StepStatus::Handling));
        assert!(StepStatus::Handling.can_transition_to(StepStatus::Success));
        assert!(!StepStatus::Failed.can_transition_to(StepStatus::Handling));
        assert_eq!(StepStatus::sources_of(StepStatus::Handling), vec![StepStatus::Init]);
        assert_eq!(
            StepStatus::sources_of(StepStatus::Failed),
            vec![StepStatus::Init, StepStatus::Handling]
        );
        assert_eq!(StepStatus::restartable(), vec![StepStatus::Failed]);
        assert!(StepStatus::Failed.is_restartable());
    }
}
