use async_trait::async_trait;

/// Work queue of suborder ids ready for dispatch.
#[async_trait]
pub trait InformerService: Send + Sync {
    /// Wait for the next key. Fails once the queue is closed.
    async fn pop(&self) -> anyhow::Result<String>;

    /// Enqueue a key unless it is already waiting.
    async fn add(&self, key: String) -> anyhow::Result<()>;
}
