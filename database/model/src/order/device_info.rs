//! Produced device, written by the matcher
use domain_apply_order::model::entity::DeviceInfo;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "device_info")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: i64,
    pub suborder_id: String,
    pub generate_id: i64,
    pub asset_id: String,
    pub ip: String,
    pub device_type: String,
    pub zone: String,
    pub is_delivered: bool,
    pub is_released: bool,
    pub create_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DeviceInfo {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id as u64,
            suborder_id: m.suborder_id,
            generate_id: m.generate_id as u64,
            asset_id: m.asset_id,
            ip: m.ip,
            device_type: m.device_type,
            zone: m.zone,
            is_delivered: m.is_delivered,
            is_released: m.is_released,
            create_at: m.create_at,
        }
    }
}
