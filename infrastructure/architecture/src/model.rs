/// Marker for an aggregate root persisted through a repository.
pub trait AggregateRoot {
    /// Key the aggregate is looked up by.
    type Id: Send + Sync + Clone + std::fmt::Debug;
}
