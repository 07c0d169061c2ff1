//! Step ledger
use domain_apply_order::model::entity::ApplyStep;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::from_i32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "apply_step")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub suborder_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub step_name: i32,
    pub order_id: i64,
    pub step_id: i32,
    pub status: i32,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub total_num: i32,
    pub success_num: i32,
    pub failed_num: i32,
    pub running_num: i32,
    pub start_at: Option<DateTimeUtc>,
    pub end_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::apply_order::Entity",
        from = "Column::SuborderId",
        to = "super::apply_order::Column::SuborderId"
    )]
    ApplyOrder,
}

impl Related<super::apply_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplyOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<ApplyStep> for Model {
    fn from(l: ApplyStep) -> Self {
        Self {
            suborder_id: l.suborder_id,
            step_name: l.step_name as i32,
            order_id: l.order_id as i64,
            step_id: l.step_id,
            status: l.status as i32,
            message: l.message,
            total_num: l.total_num as i32,
            success_num: l.success_num as i32,
            failed_num: l.failed_num as i32,
            running_num: l.running_num as i32,
            start_at: l.start_at,
            end_at: l.end_at,
        }
    }
}

impl TryInto<ApplyStep> for Model {
    type Error = anyhow::Error;

    fn try_into(self) -> Result<ApplyStep, Self::Error> {
        Ok(ApplyStep {
            suborder_id: self.suborder_id,
            order_id: self.order_id as u64,
            step_id: self.step_id,
            step_name: from_i32(self.step_name, "step name")?,
            status: from_i32(self.status, "step status")?,
            message: self.message,
            total_num: self.total_num as u32,
            success_num: self.success_num as u32,
            failed_num: self.failed_num as u32,
            running_num: self.running_num as u32,
            start_at: self.start_at,
            end_at: self.end_at,
        })
    }
}

impl Model {
    pub fn into_set(self) -> ActiveModel {
        ActiveModel {
            suborder_id: Set(self.suborder_id),
            step_name: Set(self.step_name),
            order_id: Set(self.order_id),
            step_id: Set(self.step_id),
            status: Set(self.status),
            message: Set(self.message),
            total_num: Set(self.total_num),
            success_num: Set(self.success_num),
            failed_num: Set(self.failed_num),
            running_num: Set(self.running_num),
            start_at: Set(self.start_at),
            end_at: Set(self.end_at),
        }
    }
}
