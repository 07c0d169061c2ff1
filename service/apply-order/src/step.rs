use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{
        entity::{ApplyOrder, ApplyStep, StepName, StepStatus},
        vo::{StepFilter, StepUpdate, UpdateOutcome},
    },
    repository::ApplyStepRepo,
    service::ApplyStepService,
};

#[derive(typed_builder::TypedBuilder)]
pub struct ApplyStepServiceImpl {
    step_repo: Arc<dyn ApplyStepRepo>,
}

#[async_trait]
impl ApplyStepService for ApplyStepServiceImpl {
    async fn init_steps(&self, order: &ApplyOrder) -> ApplyOrderResult<()> {
        let existing = self.step_repo.get_steps(&order.suborder_id).await?;
        for step in ApplyStep::ledger_for(order, Utc::now()) {
            if existing.iter().any(|el| el.step_name == step.step_name) {
                continue;
            }
            self.step_repo.insert_if_absent(&step).await?;
        }
        Ok(())
    }

    async fn start_step(
        &self,
        suborder_id: &str,
        step: StepName,
    ) -> ApplyOrderResult<UpdateOutcome> {
        let outcome = self
            .step_repo
            .update_immediately_with_filter(
                &StepFilter::new(suborder_id, step)
                    .with_statuses(&StepStatus::sources_of(StepStatus::Handling)),
                &StepUpdate {
                    status: Some(StepStatus::Handling),
                    start_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        tracing::debug!(suborder_id, %step, ?outcome, "Start step.");
        Ok(outcome)
    }

    async fn update_progress(
        &self,
        suborder_id: &str,
        step: StepName,
        success_num: u32,
        total_num: u32,
    ) -> ApplyOrderResult<bool> {
        let done = success_num >= total_num;
        let now = Utc::now();
        let update = StepUpdate {
            status: Some(if done {
                StepStatus::Success
            } else {
                StepStatus::Handling
            }),
            total_num: Some(total_num),
            success_num: Some(success_num),
            running_num: Some(total_num.saturating_sub(success_num)),
            end_at: done.then_some(now),
            ..Default::default()
        };
        let outcome = self
            .step_repo
            .update_immediately_with_filter(&StepFilter::new(suborder_id, step), &update)
            .await?;
        if !outcome.is_applied() {
            return Err(step_not_found(suborder_id, step));
        }
        tracing::debug!(suborder_id, %step, success_num, total_num, "Step progress.");
        Ok(done)
    }

    async fn fail_step(
        &self,
        suborder_id: &str,
        step: StepName,
        message: &str,
    ) -> ApplyOrderResult<()> {
        let outcome = self
            .step_repo
            .update_immediately_with_filter(
                &StepFilter::new(suborder_id, step),
                &StepUpdate {
                    status: Some(StepStatus::Failed),
                    message: Some(message.to_owned()),
                    end_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        if !outcome.is_applied() {
            return Err(step_not_found(suborder_id, step));
        }
        tracing::warn!(suborder_id, %step, message, "Step failed.");
        Ok(())
    }

    async fn restart_failed_steps(&self, suborder_id: &str) -> ApplyOrderResult<()> {
        let steps = self.step_repo.get_steps(suborder_id).await?;
        for step in steps.iter().filter(|el| el.status.is_restartable()) {
            self.step_repo
                .update_with_filter(
                    &StepFilter::new(suborder_id, step.step_name)
                        .with_statuses(&StepStatus::restartable()),
                    &StepUpdate {
                        status: Some(StepStatus::Handling),
                        message: Some(String::new()),
                        ..Default::default()
                    },
                )
                .await?;
        }
        Ok(())
    }

    async fn get_steps(&self, suborder_id: &str) -> ApplyOrderResult<Vec<ApplyStep>> {
        Ok(self.step_repo.get_steps(suborder_id).await?)
    }
}

fn step_not_found(suborder_id: &str, step: StepName) -> ApplyOrderException {
    ApplyOrderException::StepNotFound {
        suborder_id: suborder_id.to_owned(),
        step_name: step.to_string(),
    }
}
