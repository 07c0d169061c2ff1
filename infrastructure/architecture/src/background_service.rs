/// Long running service hosted next to the web host.
#[async_trait::async_trait]
pub trait BackgroundService: Send + Sync {
    /// Start the service, returns when the service stops.
    async fn run(&self);
}
