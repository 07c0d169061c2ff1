use std::sync::Arc;

use async_trait::async_trait;
use domain_apply_order::{
    exception::{ApplyOrderException, ApplyOrderResult},
    model::{entity::ApplyTicket, vo::RequireType},
    service::QuotaService,
};

/// Quota accounting run when a ticket is approved.
#[async_trait]
pub trait ApprovalPolicy: Send + Sync {
    /// Returns the rejection reason, if any.
    async fn check(&self, ticket: &ApplyTicket) -> ApplyOrderResult<Option<String>>;

    /// Runs once the approval is committed.
    async fn record(&self, _ticket: &ApplyTicket) -> ApplyOrderResult<()> {
        Ok(())
    }
}

/// Host quota of rolling-server and resource-pool tickets.
pub struct HostQuotaPolicy {
    pub quota: Arc<dyn QuotaService>,
}

impl HostQuotaPolicy {
    async fn applies(&self, ticket: &ApplyTicket) -> ApplyOrderResult<bool> {
        Ok(match ticket.require_type {
            RequireType::RollServer | RequireType::ResourcePool => true,
            _ => self.quota.is_res_pool_biz(ticket.biz_id).await.map_err(quota_error)?,
        })
    }
}

#[async_trait]
impl ApprovalPolicy for HostQuotaPolicy {
    async fn check(&self, ticket: &ApplyTicket) -> ApplyOrderResult<Option<String>> {
        if !self.applies(ticket).await? {
            return Ok(None);
        }
        let allowed = self
            .quota
            .can_apply_host(ticket.biz_id, ticket.require_type, ticket.total_replicas())
            .await
            .map_err(quota_error)?;
        Ok((!allowed).then(|| {
            format!(
                "Business {} has no host quota for {} devices.",
                ticket.biz_id,
                ticket.total_replicas()
            )
        }))
    }

    async fn record(&self, ticket: &ApplyTicket) -> ApplyOrderResult<()> {
        if self.applies(ticket).await? {
            self.quota.create_applied_record(ticket).await.map_err(quota_error)?;
        }
        Ok(())
    }
}

/// Core budget shared by every green-channel ticket of a business.
pub struct GreenChannelBudgetPolicy {
    pub quota: Arc<dyn QuotaService>,
    pub core_budget: u64,
}

#[async_trait]
impl ApprovalPolicy for GreenChannelBudgetPolicy {
    async fn check(&self, ticket: &ApplyTicket) -> ApplyOrderResult<Option<String>> {
        if ticket.require_type != RequireType::GreenChannel {
            return Ok(None);
        }
        let used = self
            .quota
            .get_cpu_core_sum(ticket.biz_id, RequireType::GreenChannel)
            .await
            .map_err(quota_error)?;
        let required = used + ticket.total_applied_core();
        Ok((required > self.core_budget).then(|| {
            format!(
                "Green channel needs {required} cores, over the budget of {}.",
                self.core_budget
            )
        }))
    }
}

fn quota_error(e: anyhow::Error) -> ApplyOrderException {
    ApplyOrderException::external("quota", e)
}

#[cfg(test)]
mod tests {
    use domain_apply_order::{mock::MockQuotaService, model::entity::TicketItem};

    use super::*;

    fn ticket(require_type: RequireType, replicas: u32, applied_core: u64) -> ApplyTicket {
        ApplyTicket {
            biz_id: 42,
            require_type,
            suborders: vec![TicketItem {
                replicas,
                applied_core,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn host_quota_only_for_pool_and_roll_server() {
        let mut quota = MockQuotaService::new();
        quota.expect_is_res_pool_biz().returning(|_| Ok(false));
        quota.expect_can_apply_host().never();
        let policy = HostQuotaPolicy {
            quota: Arc::new(quota),
        };
        assert_eq!(policy.check(&ticket(RequireType::Regular, 3, 24)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn host_quota_rejects_and_records() {
        let mut quota = MockQuotaService::new();
        quota
            .expect_can_apply_host()
            .withf(|biz_id, _, replicas| *biz_id == 42 && *replicas == 3)
            .returning(|_, _, _| Ok(false));
        quota.expect_create_applied_record().times(1).returning(|_| Ok(()));
        let policy = HostQuotaPolicy {
            quota: Arc::new(quota),
        };
        let t = ticket(RequireType::RollServer, 3, 24);
        assert!(policy.check(&t).await.unwrap().is_some());
        policy.record(&t).await.unwrap();
    }

    #[tokio::test]
    async fn green_channel_budget() {
        let mut quota = MockQuotaService::new();
        quota.expect_get_cpu_core_sum().returning(|_, _| Ok(100));
        let policy = GreenChannelBudgetPolicy {
            quota: Arc::new(quota),
            core_budget: 128,
        };
        assert_eq!(policy.check(&ticket(RequireType::GreenChannel, 2, 16)).await.unwrap(), None);
        assert!(policy
            .check(&ticket(RequireType::GreenChannel, 8, 64))
            .await
            .unwrap()
            .is_some());
        assert_eq!(policy.check(&ticket(RequireType::Regular, 8, 640)).await.unwrap(), None);
    }
}
