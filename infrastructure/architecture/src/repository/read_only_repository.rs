use crate::model::AggregateRoot;

/// Read only repository.
#[async_trait::async_trait]
pub trait ReadOnlyRepository<T>: Send + Sync
where
    T: Send + Sync + AggregateRoot,
{
    /// Find an entity by its key.
    async fn find_by_id(&self, id: &T::Id) -> anyhow::Result<Option<T>>;

    /// Get an entity by its key, fails when it doesn't exist.
    async fn get_by_id(&self, id: &T::Id) -> anyhow::Result<T> {
        self.find_by_id(id)
            .await?
            .ok_or(anyhow::anyhow!("There is no entity with id: {id:?}"))
    }
}
