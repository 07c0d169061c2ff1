use crate::model::AggregateRoot;

/// Mutable repository, writes are buffered until `save_changed`.
#[async_trait::async_trait]
pub trait MutableRepository<T>: Send + Sync
where
    T: Send + Sync + AggregateRoot,
{
    /// Buffer an update of the whole entity.
    async fn update(&self, entity: &T) -> anyhow::Result<()>;

    /// Buffer an insert of the entity.
    async fn insert(&self, entity: &T) -> anyhow::Result<T::Id>;

    /// Commit every buffered write in one transaction.
    ///
    /// Returns `Ok(false)` when nothing was buffered. On failure nothing is
    /// committed and the buffer is cleared.
    async fn save_changed(&self) -> anyhow::Result<bool>;

    /// Drop every buffered write without committing it.
    async fn discard_changed(&self) -> anyhow::Result<()>;
}
