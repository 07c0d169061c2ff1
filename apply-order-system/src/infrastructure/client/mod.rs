mod catalog;
mod crp;
mod generator;
mod http;
mod itsm;
mod matcher;
mod quota;

pub use catalog::{HttpCmdbService, HttpDeviceCatalogService};
pub use crp::HttpCrpService;
pub use generator::HttpGenerator;
pub use http::JsonClient;
pub use itsm::HttpItsmService;
pub use matcher::HttpMatcherService;
pub use quota::HttpQuotaService;
