//! Repository abstractions.
//!
//! Writes go through a unit of work: `insert`, `update` and guarded updates are
//! buffered and only reach the store when `save_changed` commits them in one
//! transaction. Methods named `*_immediately*` bypass the buffer.
mod mutable_repository;
mod read_only_repository;

pub use mutable_repository::MutableRepository;
pub use read_only_repository::ReadOnlyRepository;

use crate::model::AggregateRoot;

/// Repository with both read and buffered write access.
pub trait DBRepository<T>: ReadOnlyRepository<T> + MutableRepository<T>
where
    T: Send + Sync + AggregateRoot,
{
}
