mod apply_order;
mod apply_step;
mod apply_ticket;
mod device_info;
mod generate_record;
mod modify_record;

pub mod prelude {
    pub use super::{
        apply_order::{
            ActiveModel as ApplyOrderActiveModel, Column as ApplyOrderColumn,
            Entity as ApplyOrderEntity, Model as ApplyOrderModel,
            PrimaryKey as ApplyOrderPrimaryKey, Relation as ApplyOrderRelation,
        },
        apply_step::{
            ActiveModel as ApplyStepActiveModel, Column as ApplyStepColumn,
            Entity as ApplyStepEntity, Model as ApplyStepModel,
            PrimaryKey as ApplyStepPrimaryKey, Relation as ApplyStepRelation,
        },
        apply_ticket::{
            ActiveModel as ApplyTicketActiveModel, Column as ApplyTicketColumn,
            Entity as ApplyTicketEntity, Model as ApplyTicketModel,
            PrimaryKey as ApplyTicketPrimaryKey, Relation as ApplyTicketRelation,
        },
        device_info::{
            ActiveModel as DeviceInfoActiveModel, Column as DeviceInfoColumn,
            Entity as DeviceInfoEntity, Model as DeviceInfoModel,
            PrimaryKey as DeviceInfoPrimaryKey, Relation as DeviceInfoRelation,
        },
        generate_record::{
            ActiveModel as GenerateRecordActiveModel, Column as GenerateRecordColumn,
            Entity as GenerateRecordEntity, Model as GenerateRecordModel,
            PrimaryKey as GenerateRecordPrimaryKey, Relation as GenerateRecordRelation,
        },
        modify_record::{
            ActiveModel as ModifyRecordActiveModel, Column as ModifyRecordColumn,
            Entity as ModifyRecordEntity, Model as ModifyRecordModel,
            PrimaryKey as ModifyRecordPrimaryKey, Relation as ModifyRecordRelation,
        },
    };
}

/// Decode an `i32` column into a domain enum.
fn from_i32<T: num_traits::FromPrimitive>(value: i32, column: &str) -> anyhow::Result<T> {
    T::from_i32(value).ok_or(anyhow::anyhow!("Invalid {column}: {value}."))
}
