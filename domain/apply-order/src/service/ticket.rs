use async_trait::async_trait;

use crate::{
    exception::ApplyOrderResult,
    model::{
        entity::ApplyTicket,
        vo::{
            audit::{ApprovalOutcome, AuditDecision, AuditInfo},
            request::{AuditRequest, TicketRequest},
        },
    },
};

#[async_trait]
pub trait TicketService: Send + Sync {
    /// Save a draft ticket, returns its order id.
    async fn create_ticket(&self, request: TicketRequest) -> ApplyOrderResult<u64>;

    async fn update_ticket(&self, order_id: u64, request: TicketRequest) -> ApplyOrderResult<()>;

    /// Submit a draft for audit, returns the ITSM ticket id.
    async fn create_apply_order(&self, order_id: u64) -> ApplyOrderResult<String>;

    async fn check_auto_audit(&self, ticket: &ApplyTicket) -> ApplyOrderResult<AuditDecision>;

    /// Approve or reject the current ITSM node.
    async fn audit_ticket(&self, request: AuditRequest) -> ApplyOrderResult<()>;

    /// Final ITSM verdict. On approval the ticket starts running and its
    /// suborders are created.
    async fn approve_ticket(
        &self,
        order_id: u64,
        approval: bool,
        reason: &str,
    ) -> ApplyOrderResult<ApprovalOutcome>;

    async fn cancel_ticket_itsm(&self, order_id: u64, operator: &str) -> ApplyOrderResult<()>;

    /// Upgrade tickets skip the audit and run at once.
    async fn create_upgrade_ticket_and_order(
        &self,
        request: TicketRequest,
    ) -> ApplyOrderResult<ApplyTicket>;

    async fn get_ticket(&self, order_id: u64) -> ApplyOrderResult<ApplyTicket>;

    async fn get_audit_info(&self, order_id: u64) -> ApplyOrderResult<AuditInfo>;
}
