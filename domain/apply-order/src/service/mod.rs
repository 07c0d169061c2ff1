mod catalog;
mod control;
mod crp;
mod dispatch;
mod generate;
mod informer;
mod itsm;
mod matcher;
mod quota;
mod recover;
mod step;
mod ticket;

#[rustfmt::skip]
pub use {
    catalog::{CmdbService, DeviceCatalogService},
    control::OrderControlService,
    crp::CrpService,
    dispatch::DispatchService,
    generate::{GenerateService, Generator},
    informer::InformerService,
    itsm::ItsmService,
    matcher::MatcherService,
    quota::QuotaService,
    recover::RecoverService,
    step::ApplyStepService,
    ticket::TicketService,
};
