mod apply_order;
mod apply_step;
mod apply_ticket;
mod device;
mod generate_record;
mod modify_record;

#[rustfmt::skip]
pub use {
    apply_order::ApplyOrderRepo,
    apply_step::ApplyStepRepo,
    apply_ticket::ApplyTicketRepo,
    device::DeviceRepo,
    generate_record::GenerateRecordRepo,
    modify_record::ModifyRecordRepo,
};
