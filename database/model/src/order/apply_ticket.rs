//! Apply ticket
use domain_apply_order::model::entity::ApplyTicket;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};

use super::from_i32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "apply_ticket")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: i64,
    pub itsm_ticket_id: String,
    pub stage: i32,
    pub biz_id: i64,
    pub username: String,
    pub follower: Json,
    pub require_type: i32,
    pub expect_time: DateTimeUtc,
    #[sea_orm(column_type = "Text")]
    pub remark: String,
    pub suborders: Json,
    pub create_at: DateTimeUtc,
    pub update_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::apply_order::Entity")]
    ApplyOrder,
}

impl Related<super::apply_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplyOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<ApplyTicket> for Model {
    type Error = anyhow::Error;

    fn try_from(l: ApplyTicket) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: l.order_id as i64,
            itsm_ticket_id: l.itsm_ticket_id,
            stage: l.stage as i32,
            biz_id: l.biz_id,
            username: l.user,
            follower: serde_json::to_value(l.follower)?,
            require_type: l.require_type as i32,
            expect_time: l.expect_time,
            remark: l.remark,
            suborders: serde_json::to_value(l.suborders)?,
            create_at: l.create_at,
            update_at: l.update_at,
        })
    }
}

impl TryInto<ApplyTicket> for Model {
    type Error = anyhow::Error;

    fn try_into(self) -> Result<ApplyTicket, Self::Error> {
        Ok(ApplyTicket {
            order_id: self.order_id as u64,
            itsm_ticket_id: self.itsm_ticket_id,
            stage: from_i32(self.stage, "ticket stage")?,
            biz_id: self.biz_id,
            user: self.username,
            follower: serde_json::from_value(self.follower)?,
            require_type: from_i32(self.require_type, "require type")?,
            expect_time: self.expect_time,
            remark: self.remark,
            suborders: serde_json::from_value(self.suborders)?,
            create_at: self.create_at,
            update_at: self.update_at,
        })
    }
}

impl Model {
    /// Every column set except the creation time.
    pub fn into_set(self) -> ActiveModel {
        ActiveModel {
            order_id: Set(self.order_id),
            itsm_ticket_id: Set(self.itsm_ticket_id),
            stage: Set(self.stage),
            biz_id: Set(self.biz_id),
            username: Set(self.username),
            follower: Set(self.follower),
            require_type: Set(self.require_type),
            expect_time: Set(self.expect_time),
            remark: Set(self.remark),
            suborders: Set(self.suborders),
            update_at: Set(self.update_at),
            create_at: ActiveValue::Unchanged(self.create_at),
        }
    }
}
