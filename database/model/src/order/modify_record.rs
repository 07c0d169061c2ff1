//! Modification audit trail
use domain_apply_order::model::entity::ModifyRecord;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "modify_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub order_id: i64,
    pub suborder_id: String,
    pub operator: String,
    pub pre_data: Json,
    pub cur_data: Json,
    pub create_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<ModifyRecord> for Model {
    type Error = anyhow::Error;

    fn try_from(l: ModifyRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: l.id as i64,
            order_id: l.order_id as i64,
            suborder_id: l.suborder_id,
            operator: l.operator,
            pre_data: serde_json::to_value(l.pre_data)?,
            cur_data: serde_json::to_value(l.cur_data)?,
            create_at: l.create_at,
        })
    }
}

impl TryInto<ModifyRecord> for Model {
    type Error = anyhow::Error;

    fn try_into(self) -> Result<ModifyRecord, Self::Error> {
        Ok(ModifyRecord {
            id: self.id as u64,
            order_id: self.order_id as u64,
            suborder_id: self.suborder_id,
            operator: self.operator,
            pre_data: serde_json::from_value(self.pre_data)?,
            cur_data: serde_json::from_value(self.cur_data)?,
            create_at: self.create_at,
        })
    }
}

impl Model {
    /// Every column set except the creation time.
    pub fn into_set(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            order_id: Set(self.order_id),
            suborder_id: Set(self.suborder_id),
            operator: Set(self.operator),
            pre_data: Set(self.pre_data),
            cur_data: Set(self.cur_data),
            create_at: ActiveValue::Unchanged(self.create_at),
        }
    }
}
