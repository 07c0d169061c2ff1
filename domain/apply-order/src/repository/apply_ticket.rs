use async_trait::async_trait;
use infrastructure_architecture::repository::DBRepository;

use crate::model::entity::{ApplyTicket, TicketStage};

#[async_trait]
pub trait ApplyTicketRepo: DBRepository<ApplyTicket> + Send + Sync {
    /// Next value of the ticket id sequence.
    async fn next_order_id(&self) -> anyhow::Result<u64>;

    /// Buffer an update that only applies while the stored ticket is at one of
    /// `stages`. Committing fails if it no longer is.
    async fn update_with_guard(
        &self,
        entity: &ApplyTicket,
        stages: &[TicketStage],
    ) -> anyhow::Result<()>;
}
