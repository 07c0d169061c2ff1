pub mod apply_order;
pub mod apply_step;
pub mod apply_ticket;
pub mod device;
pub mod generate_record;
pub mod modify_record;

#[rustfmt::skip]
pub use {
    apply_order::{ApplyOrder, ApplyStatus},
    apply_step::{ApplyStep, StepName, StepStatus},
    apply_ticket::{ApplyTicket, TicketItem, TicketStage},
    device::DeviceInfo,
    generate_record::{GenerateRecord, GenerateStatus},
    modify_record::{ModifyRecord, ModifySnapshot},
};
