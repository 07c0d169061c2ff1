//! Generation call issued to CRP
use domain_apply_order::model::entity::GenerateRecord;
use sea_orm::entity::prelude::*;

use super::from_i32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "generate_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub generate_id: i64,
    pub suborder_id: String,
    pub task_id: String,
    pub status: i32,
    pub is_matched: bool,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub create_at: DateTimeUtc,
    pub update_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryInto<GenerateRecord> for Model {
    type Error = anyhow::Error;

    fn try_into(self) -> Result<GenerateRecord, Self::Error> {
        Ok(GenerateRecord {
            generate_id: self.generate_id as u64,
            suborder_id: self.suborder_id,
            task_id: self.task_id,
            status: from_i32(self.status, "generate status")?,
            is_matched: self.is_matched,
            message: self.message,
            create_at: self.create_at,
            update_at: self.update_at,
        })
    }
}
