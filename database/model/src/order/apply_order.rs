//! Suborder
use domain_apply_order::model::entity::ApplyOrder;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};

use super::from_i32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "apply_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub suborder_id: String,
    pub order_id: i64,
    pub biz_id: i64,
    pub username: String,
    pub require_type: i32,
    pub resource_type: i32,
    pub stage: i32,
    pub status: i32,
    pub origin_num: i32,
    pub total_num: i32,
    pub pending_num: i32,
    pub success_num: i32,
    pub applied_core: i64,
    pub delivered_core: i64,
    pub retry_time: i32,
    pub modify_time: i32,
    pub enable_disk_check: bool,
    pub anti_affinity_level: String,
    #[sea_orm(column_type = "Text")]
    pub remark: String,
    pub spec: Json,
    pub create_at: DateTimeUtc,
    pub update_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::apply_ticket::Entity",
        from = "Column::OrderId",
        to = "super::apply_ticket::Column::OrderId"
    )]
    ApplyTicket,
    #[sea_orm(has_many = "super::apply_step::Entity")]
    ApplyStep,
}

impl Related<super::apply_ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplyTicket.def()
    }
}

impl Related<super::apply_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplyStep.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<ApplyOrder> for Model {
    type Error = anyhow::Error;

    fn try_from(l: ApplyOrder) -> Result<Self, Self::Error> {
        Ok(Self {
            suborder_id: l.suborder_id,
            order_id: l.order_id as i64,
            biz_id: l.biz_id,
            username: l.user,
            require_type: l.require_type as i32,
            resource_type: l.resource_type as i32,
            stage: l.stage as i32,
            status: l.status as i32,
            origin_num: l.origin_num as i32,
            total_num: l.total_num as i32,
            pending_num: l.pending_num as i32,
            success_num: l.success_num as i32,
            applied_core: l.applied_core as i64,
            delivered_core: l.delivered_core as i64,
            retry_time: l.retry_time as i32,
            modify_time: l.modify_time as i32,
            enable_disk_check: l.enable_disk_check,
            anti_affinity_level: l.anti_affinity_level,
            remark: l.remark,
            spec: serde_json::to_value(l.spec)?,
            create_at: l.create_at,
            update_at: l.update_at,
        })
    }
}

impl TryInto<ApplyOrder> for Model {
    type Error = anyhow::Error;

    fn try_into(self) -> Result<ApplyOrder, Self::Error> {
        Ok(ApplyOrder {
            order_id: self.order_id as u64,
            suborder_id: self.suborder_id,
            biz_id: self.biz_id,
            user: self.username,
            require_type: from_i32(self.require_type, "require type")?,
            resource_type: from_i32(self.resource_type, "resource type")?,
            stage: from_i32(self.stage, "suborder stage")?,
            status: from_i32(self.status, "suborder status")?,
            origin_num: self.origin_num as u32,
            total_num: self.total_num as u32,
            pending_num: self.pending_num as u32,
            success_num: self.success_num as u32,
            applied_core: self.applied_core as u64,
            delivered_core: self.delivered_core as u64,
            retry_time: self.retry_time as u32,
            modify_time: self.modify_time as u32,
            enable_disk_check: self.enable_disk_check,
            anti_affinity_level: self.anti_affinity_level,
            remark: self.remark,
            spec: serde_json::from_value(self.spec)?,
            create_at: self.create_at,
            update_at: self.update_at,
        })
    }
}

impl Model {
    /// Every column set except the creation time.
    pub fn into_set(self) -> ActiveModel {
        ActiveModel {
            suborder_id: Set(self.suborder_id),
            order_id: Set(self.order_id),
            biz_id: Set(self.biz_id),
            username: Set(self.username),
            require_type: Set(self.require_type),
            resource_type: Set(self.resource_type),
            stage: Set(self.stage),
            status: Set(self.status),
            origin_num: Set(self.origin_num),
            total_num: Set(self.total_num),
            pending_num: Set(self.pending_num),
            success_num: Set(self.success_num),
            applied_core: Set(self.applied_core),
            delivered_core: Set(self.delivered_core),
            retry_time: Set(self.retry_time),
            modify_time: Set(self.modify_time),
            enable_disk_check: Set(self.enable_disk_check),
            anti_affinity_level: Set(self.anti_affinity_level),
            remark: Set(self.remark),
            spec: Set(self.spec),
            update_at: Set(self.update_at),
            create_at: ActiveValue::Unchanged(self.create_at),
        }
    }
}
