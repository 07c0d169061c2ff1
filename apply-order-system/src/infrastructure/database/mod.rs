mod orm;

pub use orm::{OrmRepo, PendingStatement};
