use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashSet;
use domain_apply_order::{repository::ApplyOrderRepo, service::InformerService};
use infrastructure_architecture::background_service::BackgroundService;
use tracing::Instrument;

/// Unbounded work queue that keeps at most one waiting copy of each key.
pub struct FlumeInformer {
    sender: Mutex<Option<flume::Sender<String>>>,
    receiver: flume::Receiver<String>,
    queued: DashSet<String>,
}

impl Default for FlumeInformer {
    fn default() -> Self {
        Self::new()
    }
}

impl FlumeInformer {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            queued: DashSet::new(),
        }
    }

    /// Stop accepting keys. Waiting keys are still handed out, then `pop` fails.
    pub fn close(&self) {
        self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[async_trait]
impl InformerService for FlumeInformer {
    async fn pop(&self) -> anyhow::Result<String> {
        let key = self.receiver.recv_async().await?;
        self.queued.remove(&key);
        Ok(key)
    }

    async fn add(&self, key: String) -> anyhow::Result<()> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(anyhow::anyhow!("Informer is closed."))?;
        if !self.queued.insert(key.clone()) {
            tracing::trace!(%key, "Key is already queued.");
            return Ok(());
        }
        if let Err(e) = sender.send_async(key.clone()).await {
            self.queued.remove(&key);
            anyhow::bail!(e);
        }
        Ok(())
    }
}

/// Periodically feeds dispatchable suborders to the informer.
#[derive(typed_builder::TypedBuilder)]
pub struct ReadyOrderWatcher {
    order_repo: Arc<dyn ApplyOrderRepo>,
    informer: Arc<dyn InformerService>,
    interval: Duration,
    #[builder(default = 500)]
    batch_size: u64,
}

impl ReadyOrderWatcher {
    pub async fn scan(&self) -> anyhow::Result<usize> {
        let ids = self.order_repo.get_dispatchable_ids(self.batch_size).await?;
        let count = ids.len();
        for id in ids {
            self.informer.add(id).await?;
        }
        Ok(count)
    }
}

#[async_trait]
impl BackgroundService for ReadyOrderWatcher {
    async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            match self.scan().instrument(tracing::trace_span!("ready_order_watcher")).await {
                Ok(count) if count > 0 => tracing::debug!(count, "Enqueued ready suborders."),
                Ok(_) => {}
                Err(e) => tracing::error!("Scan for ready suborders failed: {e}"),
            }
        }
    }
}
