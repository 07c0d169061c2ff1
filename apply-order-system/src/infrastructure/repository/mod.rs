mod apply_order;
mod apply_step;
mod apply_ticket;
mod device;
mod generate_record;
mod modify_record;
