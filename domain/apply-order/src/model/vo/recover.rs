use tokio::task::JoinHandle;

use crate::exception::{ApplyOrderException, ApplyOrderResult};

/// How a recovery loop finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Enough devices were already produced.
    AlreadyProduced,
    /// Generation records whose devices were released back to the matcher.
    Rematched { generate_ids: Vec<u64> },
}

/// A detached recovery loop.
///
/// Dropping the handle keeps the loop running.
#[derive(Debug)]
pub struct RecoverHandle {
    suborder_id: String,
    inner: JoinHandle<ApplyOrderResult<RetryOutcome>>,
}

impl RecoverHandle {
    pub fn new(suborder_id: String, inner: JoinHandle<ApplyOrderResult<RetryOutcome>>) -> Self {
        Self { suborder_id, inner }
    }

    pub fn suborder_id(&self) -> &str {
        &self.suborder_id
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    pub async fn join(self) -> ApplyOrderResult<RetryOutcome> {
        match self.inner.await {
            Ok(res) => res,
            Err(e) => Err(ApplyOrderException::InternalError {
                source: anyhow::anyhow!("Recover task of {} aborted: {e}", self.suborder_id),
            }),
        }
    }
}
