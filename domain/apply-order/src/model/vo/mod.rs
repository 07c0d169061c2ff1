pub mod audit;
pub mod catalog;
pub mod crp;
pub mod dispatch;
pub mod filter;
pub mod itsm;
pub mod recover;
pub mod request;
pub mod spec;

#[rustfmt::skip]
pub use {
    dispatch::DispatchOutcome,
    filter::{CounterUpdate, OrderFilter, OrderUpdate, StepFilter, StepUpdate, UpdateOutcome},
    recover::{RecoverHandle, RetryOutcome},
    spec::{ChargeType, RequireType, ResourceSpec, ResourceType},
};
