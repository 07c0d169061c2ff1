use domain_apply_order::model::{
    entity::ApplyTicket,
    vo::{audit::AuditDecision, RequireType},
};

/// One reason a ticket needs a human approver.
pub trait AuditRule: Send + Sync {
    /// Returns the reason when the rule fires.
    fn check(&self, ticket: &ApplyTicket) -> Option<String>;
}

/// Too many devices in one ticket.
pub struct DeviceCountRule {
    pub max_replicas: u32,
}

impl AuditRule for DeviceCountRule {
    fn check(&self, ticket: &ApplyTicket) -> Option<String> {
        let replicas = ticket.total_replicas();
        (replicas > self.max_replicas).then(|| {
            format!(
                "Ticket applies {replicas} devices, more than {} allowed without audit.",
                self.max_replicas
            )
        })
    }
}

/// Green-channel tickets above the core threshold.
pub struct GreenChannelCoreRule {
    pub max_core: u64,
}

impl AuditRule for GreenChannelCoreRule {
    fn check(&self, ticket: &ApplyTicket) -> Option<String> {
        if ticket.require_type != RequireType::GreenChannel {
            return None;
        }
        let cores = ticket.total_applied_core();
        (cores > self.max_core).then(|| {
            format!(
                "Green channel ticket applies {cores} cores, more than {} allowed without audit.",
                self.max_core
            )
        })
    }
}

/// Physical machines are always audited.
pub struct PhysicalMachineRule;

impl AuditRule for PhysicalMachineRule {
    fn check(&self, ticket: &ApplyTicket) -> Option<String> {
        ticket
            .has_physical_machine()
            .then(|| "Ticket applies physical machines.".to_owned())
    }
}

/// Rules evaluated in order, the first one firing decides.
#[derive(Default)]
pub struct AuditChain {
    rules: Vec<Box<dyn AuditRule>>,
}

impl AuditChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: impl AuditRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn evaluate(&self, ticket: &ApplyTicket) -> AuditDecision {
        self.rules
            .iter()
            .find_map(|rule| rule.check(ticket))
            .map_or(AuditDecision::Auto, |reason| AuditDecision::Manual { reason })
    }
}

#[cfg(test)]
mod tests {
    use domain_apply_order::model::{entity::TicketItem, vo::ResourceType};

    use super::*;

    fn chain() -> AuditChain {
        AuditChain::new()
            .rule(DeviceCountRule { max_replicas: 10 })
            .rule(GreenChannelCoreRule { max_core: 64 })
            .rule(PhysicalMachineRule)
    }

    fn ticket(require_type: RequireType, items: Vec<(ResourceType, u32, u64)>) -> ApplyTicket {
        ApplyTicket {
            require_type,
            suborders: items
                .into_iter()
                .map(|(resource_type, replicas, applied_core)| TicketItem {
                    resource_type,
                    replicas,
                    applied_core,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn small_cloud_ticket_is_auto() {
        let t = ticket(RequireType::Regular, vec![(ResourceType::QCloudCvm, 4, 32)]);
        assert!(chain().evaluate(&t).is_auto());
    }

    #[test]
    fn first_firing_rule_gives_reason() {
        let t = ticket(RequireType::GreenChannel, vec![(ResourceType::IdcPm, 20, 640)]);
        let AuditDecision::Manual { reason } = chain().evaluate(&t) else {
            panic!("expected manual audit");
        };
        assert!(reason.contains("20 devices"));
    }

    #[test]
    fn green_channel_and_physical_rules() {
        let t = ticket(RequireType::GreenChannel, vec![(ResourceType::QCloudCvm, 2, 128)]);
        assert!(matches!(chain().evaluate(&t), AuditDecision::Manual { reason } if reason.contains("128 cores")));

        let t = ticket(RequireType::Regular, vec![(ResourceType::IdcPm, 1, 8)]);
        assert!(!chain().evaluate(&t).is_auto());
    }
}
