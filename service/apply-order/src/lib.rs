mod approval;
mod audit;
mod control;
mod dispatch;
mod generate;
mod informer;
mod recover;
mod step;
mod ticket;

pub use approval::{ApprovalPolicy, GreenChannelBudgetPolicy, HostQuotaPolicy};
pub use audit::{AuditChain, AuditRule, DeviceCountRule, GreenChannelCoreRule, PhysicalMachineRule};
pub use control::OrderControlServiceImpl;
pub use dispatch::{DispatchServiceImpl, Dispatcher};
pub use generate::GenerateServiceImpl;
pub use informer::{FlumeInformer, ReadyOrderWatcher};
pub use recover::{spawn_recover, RecoverServiceImpl};
pub use step::ApplyStepServiceImpl;
pub use ticket::TicketServiceImpl;
