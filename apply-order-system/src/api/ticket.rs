use actix_web::{
    get, post,
    web::{Data, Json, Path},
};
use domain_apply_order::model::{
    entity::ApplyTicket,
    vo::{
        audit::{ApprovalOutcome, AuditDecision, AuditInfo},
        request::{AuditRequest, TicketRequest},
    },
};
use serde::Deserialize;

use super::{respond, ApiResponse};
use crate::infrastructure::ServiceProvider;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub approval: bool,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub operator: String,
}

#[tracing::instrument(skip(sp, request))]
#[post("ticket/CreateTicket")]
pub async fn create_ticket(
    sp: Data<ServiceProvider>,
    request: Json<TicketRequest>,
) -> ApiResponse<u64> {
    respond(sp.ticket_service().create_ticket(request.into_inner()).await)
}

#[tracing::instrument(skip(sp, request))]
#[post("ticket/UpdateTicket/{order_id}")]
pub async fn update_ticket(
    sp: Data<ServiceProvider>,
    order_id: Path<u64>,
    request: Json<TicketRequest>,
) -> ApiResponse<()> {
    respond(
        sp.ticket_service()
            .update_ticket(order_id.into_inner(), request.into_inner())
            .await,
    )
}

/// Submit a draft, returns the ITSM ticket id.
#[tracing::instrument(skip(sp))]
#[post("ticket/SubmitTicket/{order_id}")]
pub async fn submit_ticket(sp: Data<ServiceProvider>, order_id: Path<u64>) -> ApiResponse<String> {
    respond(sp.ticket_service().create_apply_order(order_id.into_inner()).await)
}

#[tracing::instrument(skip(sp))]
#[get("ticket/CheckAutoAudit/{order_id}")]
pub async fn check_auto_audit(
    sp: Data<ServiceProvider>,
    order_id: Path<u64>,
) -> ApiResponse<AuditDecision> {
    let service = sp.ticket_service();
    let res = async {
        let ticket = service.get_ticket(order_id.into_inner()).await?;
        service.check_auto_audit(&ticket).await
    }
    .await;
    respond(res)
}

#[tracing::instrument(skip(sp, request))]
#[post("ticket/AuditTicket")]
pub async fn audit_ticket(
    sp: Data<ServiceProvider>,
    request: Json<AuditRequest>,
) -> ApiResponse<()> {
    respond(sp.ticket_service().audit_ticket(request.into_inner()).await)
}

/// Final verdict of the approval workflow.
#[tracing::instrument(skip(sp, request))]
#[post("ticket/ApproveTicket/{order_id}")]
pub async fn approve_ticket(
    sp: Data<ServiceProvider>,
    order_id: Path<u64>,
    request: Json<ApproveRequest>,
) -> ApiResponse<ApprovalOutcome> {
    respond(
        sp.ticket_service()
            .approve_ticket(order_id.into_inner(), request.approval, &request.reason)
            .await,
    )
}

#[tracing::instrument(skip(sp, request))]
#[post("ticket/CancelTicketItsm/{order_id}")]
pub async fn cancel_ticket_itsm(
    sp: Data<ServiceProvider>,
    order_id: Path<u64>,
    request: Json<CancelRequest>,
) -> ApiResponse<()> {
    respond(
        sp.ticket_service()
            .cancel_ticket_itsm(order_id.into_inner(), &request.operator)
            .await,
    )
}

#[tracing::instrument(skip(sp, request))]
#[post("ticket/CreateUpgradeTicket")]
pub async fn create_upgrade_ticket(
    sp: Data<ServiceProvider>,
    request: Json<TicketRequest>,
) -> ApiResponse<ApplyTicket> {
    respond(
        sp.ticket_service()
            .create_upgrade_ticket_and_order(request.into_inner())
            .await,
    )
}

#[tracing::instrument(skip(sp))]
#[get("ticket/GetTicket/{order_id}")]
pub async fn get_ticket(sp: Data<ServiceProvider>, order_id: Path<u64>) -> ApiResponse<ApplyTicket> {
    respond(sp.ticket_service().get_ticket(order_id.into_inner()).await)
}

#[tracing::instrument(skip(sp))]
#[get("ticket/GetAuditInfo/{order_id}")]
pub async fn get_audit_info(
    sp: Data<ServiceProvider>,
    order_id: Path<u64>,
) -> ApiResponse<AuditInfo> {
    respond(sp.ticket_service().get_audit_info(order_id.into_inner()).await)
}
