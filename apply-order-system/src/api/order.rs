use actix_web::{
    get, post,
    web::{Data, Json, Path},
};
use domain_apply_order::model::{
    entity::{ApplyOrder, ApplyStep, ModifyRecord},
    vo::{request::ModifyRequest, RecoverHandle},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{respond, ApiResponse};
use crate::infrastructure::ServiceProvider;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuborderIdsRequest {
    pub suborder_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverRequest {
    pub device_ids: Vec<Uuid>,
}

/// Recovery loops keep running detached, the caller only gets the ids.
fn detach(handles: Vec<RecoverHandle>) -> Vec<String> {
    handles
        .into_iter()
        .map(|el| el.suborder_id().to_owned())
        .collect()
}

#[tracing::instrument(skip(sp, request))]
#[post("order/StartOrder")]
pub async fn start_order(
    sp: Data<ServiceProvider>,
    request: Json<SuborderIdsRequest>,
) -> ApiResponse<Vec<String>> {
    let res = sp.order_control_service().start(&request.suborder_ids).await;
    respond(res.map(detach))
}

#[tracing::instrument(skip(sp, request))]
#[post("order/PauseOrder")]
pub async fn pause_order(
    sp: Data<ServiceProvider>,
    request: Json<SuborderIdsRequest>,
) -> ApiResponse<()> {
    respond(sp.order_control_service().pause(&request.suborder_ids).await)
}

#[tracing::instrument(skip(sp, request))]
#[post("order/TerminateOrder")]
pub async fn terminate_order(
    sp: Data<ServiceProvider>,
    request: Json<SuborderIdsRequest>,
) -> ApiResponse<()> {
    respond(sp.order_control_service().terminate(&request.suborder_ids).await)
}

#[tracing::instrument(skip(sp, request))]
#[post("order/ModifyOrder")]
pub async fn modify_order(
    sp: Data<ServiceProvider>,
    request: Json<ModifyRequest>,
) -> ApiResponse<String> {
    let res = sp.order_control_service().modify(request.into_inner()).await;
    respond(res.map(|handle| handle.suborder_id().to_owned()))
}

#[tracing::instrument(skip(sp))]
#[post("order/CancelCrp/{suborder_id}")]
pub async fn cancel_crp(sp: Data<ServiceProvider>, suborder_id: Path<String>) -> ApiResponse<()> {
    respond(sp.order_control_service().cancel_crp(&suborder_id).await)
}

#[tracing::instrument(skip(sp, request))]
#[post("order/DeliverDevices/{suborder_id}")]
pub async fn deliver_devices(
    sp: Data<ServiceProvider>,
    suborder_id: Path<String>,
    request: Json<DeliverRequest>,
) -> ApiResponse<ApplyOrder> {
    respond(
        sp.order_control_service()
            .deliver_devices(&suborder_id, &request.device_ids)
            .await,
    )
}

#[tracing::instrument(skip(sp))]
#[post("order/RunDiskCheck/{suborder_id}")]
pub async fn run_disk_check(
    sp: Data<ServiceProvider>,
    suborder_id: Path<String>,
) -> ApiResponse<()> {
    respond(sp.order_control_service().run_disk_check(&suborder_id).await)
}

#[tracing::instrument(skip(sp))]
#[get("order/GetSuborders/{order_id}")]
pub async fn get_suborders(
    sp: Data<ServiceProvider>,
    order_id: Path<u64>,
) -> ApiResponse<Vec<ApplyOrder>> {
    respond(sp.order_control_service().get_suborders(order_id.into_inner()).await)
}

#[tracing::instrument(skip(sp))]
#[get("order/GetSteps/{suborder_id}")]
pub async fn get_steps(
    sp: Data<ServiceProvider>,
    suborder_id: Path<String>,
) -> ApiResponse<Vec<ApplyStep>> {
    respond(sp.order_control_service().get_steps(&suborder_id).await)
}

#[tracing::instrument(skip(sp))]
#[get("order/GetModifyRecords/{suborder_id}")]
pub async fn get_modify_records(
    sp: Data<ServiceProvider>,
    suborder_id: Path<String>,
) -> ApiResponse<Vec<ModifyRecord>> {
    respond(sp.order_control_service().get_modify_records(&suborder_id).await)
}
