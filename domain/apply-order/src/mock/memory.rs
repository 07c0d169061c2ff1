use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use infrastructure_architecture::repository::{
    DBRepository, MutableRepository, ReadOnlyRepository,
};
use uuid::Uuid;

use crate::{
    model::{
        entity::{
            ApplyOrder, ApplyStep, ApplyTicket, DeviceInfo, GenerateRecord, ModifyRecord,
            StepName, TicketStage,
        },
        vo::{OrderFilter, OrderUpdate, StepFilter, StepUpdate, UpdateOutcome},
    },
    repository::{
        ApplyOrderRepo, ApplyStepRepo, ApplyTicketRepo, DeviceRepo, GenerateRecordRepo,
        ModifyRecordRepo,
    },
};

#[derive(Clone, Default)]
struct MemoryState {
    tickets: BTreeMap<u64, ApplyTicket>,
    orders: BTreeMap<String, ApplyOrder>,
    steps: BTreeMap<(String, StepName), ApplyStep>,
    records: BTreeMap<u64, ModifyRecord>,
    devices: BTreeMap<Uuid, DeviceInfo>,
    generate_records: BTreeMap<u64, GenerateRecord>,
    order_seq: u64,
    record_seq: u64,
}

enum PendingWrite {
    InsertTicket(ApplyTicket),
    UpdateTicket(ApplyTicket),
    GuardedTicket(ApplyTicket, Vec<TicketStage>),
    InsertOrder(ApplyOrder),
    UpdateOrder(ApplyOrder),
    FilteredOrder(OrderFilter, OrderUpdate),
    InsertStep(ApplyStep),
    InsertStepIfAbsent(ApplyStep),
    UpdateStep(ApplyStep),
    FilteredStep(StepFilter, StepUpdate),
    InsertRecord(ModifyRecord),
    UpdateRecord(ModifyRecord),
}

impl PendingWrite {
    fn apply(self, state: &mut MemoryState) -> anyhow::Result<()> {
        match self {
            Self::InsertTicket(ticket) => {
                if state.tickets.contains_key(&ticket.order_id) {
                    anyhow::bail!("Duplicated ticket: {}", ticket.order_id);
                }
                state.tickets.insert(ticket.order_id, ticket);
            }
            Self::UpdateTicket(ticket) => {
                if let Some(stored) = state.tickets.get_mut(&ticket.order_id) {
                    *stored = ticket;
                }
            }
            Self::GuardedTicket(ticket, stages) => {
                let stored = state
                    .tickets
                    .get_mut(&ticket.order_id)
                    .filter(|el| stages.contains(&el.stage))
                    .ok_or(anyhow::anyhow!(
                        "Ticket: {} is no longer at {stages:?}",
                        ticket.order_id
                    ))?;
                *stored = ticket;
            }
            Self::InsertOrder(order) => {
                if state.orders.contains_key(&order.suborder_id) {
                    anyhow::bail!("Duplicated suborder: {}", order.suborder_id);
                }
                state.orders.insert(order.suborder_id.clone(), order);
            }
            Self::UpdateOrder(order) => {
                if let Some(stored) = state.orders.get_mut(&order.suborder_id) {
                    *stored = order;
                }
            }
            Self::FilteredOrder(filter, update) => {
                let stored = state
                    .orders
                    .get_mut(&filter.suborder_id)
                    .filter(|el| filter.matches(el))
                    .ok_or(anyhow::anyhow!(
                        "Suborder: {} doesn't match {filter:?}",
                        filter.suborder_id
                    ))?;
                update.apply_to(stored, Utc::now());
            }
            Self::InsertStep(step) => {
                let key = (step.suborder_id.clone(), step.step_name);
                if state.steps.contains_key(&key) {
                    anyhow::bail!("Duplicated step: {key:?}");
                }
                state.steps.insert(key, step);
            }
            Self::InsertStepIfAbsent(step) => {
                state.steps.entry((step.suborder_id.clone(), step.step_name)).or_insert(step);
            }
            Self::UpdateStep(step) => {
                if let Some(stored) = state.steps.get_mut(&(step.suborder_id.clone(), step.step_name)) {
                    *stored = step;
                }
            }
            Self::FilteredStep(filter, update) => {
                let key = (filter.suborder_id.clone(), filter.step_name);
                if let Some(stored) = state.steps.get_mut(&key).filter(|el| filter.matches(el)) {
                    update.apply_to(stored);
                }
            }
            Self::InsertRecord(record) => {
                if state.records.contains_key(&record.id) {
                    anyhow::bail!("Duplicated modify record: {}", record.id);
                }
                state.records.insert(record.id, record);
            }
            Self::UpdateRecord(record) => {
                if let Some(stored) = state.records.get_mut(&record.id) {
                    *stored = record;
                }
            }
        }
        Ok(())
    }
}

/// In-memory store implementing every repository with the same buffered
/// unit of work and conditional updates as the database store.
#[derive(Default)]
pub struct MemoryRepo {
    state: Arc<Mutex<MemoryState>>,
    pending: Mutex<Vec<PendingWrite>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository over the same data with its own write buffer.
    pub fn scoped(&self) -> Self {
        Self {
            state: self.state.clone(),
            pending: Mutex::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, write: PendingWrite) {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).push(write);
    }

    fn commit(&self) -> anyhow::Result<bool> {
        let writes = std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
        if writes.is_empty() {
            return Ok(false);
        }
        let mut state = self.state();
        let mut next = state.clone();
        for write in writes {
            write.apply(&mut next)?;
        }
        *state = next;
        Ok(true)
    }

    fn discard(&self) {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn seed_ticket(&self, ticket: ApplyTicket) {
        let mut state = self.state();
        state.order_seq = state.order_seq.max(ticket.order_id);
        state.tickets.insert(ticket.order_id, ticket);
    }

    pub fn seed_order(&self, order: ApplyOrder) {
        self.state().orders.insert(order.suborder_id.clone(), order);
    }

    pub fn seed_step(&self, step: ApplyStep) {
        self.state().steps.insert((step.suborder_id.clone(), step.step_name), step);
    }

    pub fn seed_device(&self, device: DeviceInfo) {
        self.state().devices.insert(device.id, device);
    }

    pub fn seed_generate_record(&self, record: GenerateRecord) {
        self.state().generate_records.insert(record.generate_id, record);
    }

    pub fn ticket(&self, order_id: u64) -> Option<ApplyTicket> {
        self.state().tickets.get(&order_id).cloned()
    }

    pub fn order(&self, suborder_id: &str) -> Option<ApplyOrder> {
        self.state().orders.get(suborder_id).cloned()
    }

    pub fn orders(&self) -> Vec<ApplyOrder> {
        self.state().orders.values().cloned().collect()
    }

    pub fn step(&self, suborder_id: &str, step_name: StepName) -> Option<ApplyStep> {
        self.state().steps.get(&(suborder_id.to_owned(), step_name)).cloned()
    }

    pub fn steps_of(&self, suborder_id: &str) -> Vec<ApplyStep> {
        let state = self.state();
        state.steps.values().filter(|el| el.suborder_id == suborder_id).cloned().collect()
    }

    pub fn records_of(&self, suborder_id: &str) -> Vec<ModifyRecord> {
        let state = self.state();
        state.records.values().filter(|el| el.suborder_id == suborder_id).cloned().collect()
    }

    pub fn generate_record(&self, generate_id: u64) -> Option<GenerateRecord> {
        self.state().generate_records.get(&generate_id).cloned()
    }

    pub fn device(&self, id: Uuid) -> Option<DeviceInfo> {
        self.state().devices.get(&id).cloned()
    }

    /// Mark devices delivered, as the matcher does.
    pub fn mark_delivered(&self, ids: &[Uuid]) {
        let mut state = self.state();
        for id in ids {
            if let Some(device) = state.devices.get_mut(id) {
                device.is_delivered = true;
            }
        }
    }
}

#[async_trait]
impl ReadOnlyRepository<ApplyTicket> for MemoryRepo {
    async fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<ApplyTicket>> {
        Ok(self.ticket(*id))
    }
}

#[async_trait]
impl MutableRepository<ApplyTicket> for MemoryRepo {
    async fn update(&self, entity: &ApplyTicket) -> anyhow::Result<()> {
        self.push(PendingWrite::UpdateTicket(entity.clone()));
        Ok(())
    }

    async fn insert(&self, entity: &ApplyTicket) -> anyhow::Result<u64> {
        self.push(PendingWrite::InsertTicket(entity.clone()));
        Ok(entity.order_id)
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.commit()
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard();
        Ok(())
    }
}

impl DBRepository<ApplyTicket> for MemoryRepo {}

#[async_trait]
impl ApplyTicketRepo for MemoryRepo {
    async fn next_order_id(&self) -> anyhow::Result<u64> {
        let mut state = self.state();
        state.order_seq += 1;
        Ok(state.order_seq)
    }

    async fn update_with_guard(
        &self,
        entity: &ApplyTicket,
        stages: &[TicketStage],
    ) -> anyhow::Result<()> {
        self.push(PendingWrite::GuardedTicket(entity.clone(), stages.to_vec()));
        Ok(())
    }
}

#[async_trait]
impl ReadOnlyRepository<ApplyOrder> for MemoryRepo {
    async fn find_by_id(&self, id: &String) -> anyhow::Result<Option<ApplyOrder>> {
        Ok(self.order(id))
    }
}

#[async_trait]
impl MutableRepository<ApplyOrder> for MemoryRepo {
    async fn update(&self, entity: &ApplyOrder) -> anyhow::Result<()> {
        self.push(PendingWrite::UpdateOrder(entity.clone()));
        Ok(())
    }

    async fn insert(&self, entity: &ApplyOrder) -> anyhow::Result<String> {
        self.push(PendingWrite::InsertOrder(entity.clone()));
        Ok(entity.suborder_id.clone())
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.commit()
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard();
        Ok(())
    }
}

impl DBRepository<ApplyOrder> for MemoryRepo {}

#[async_trait]
impl ApplyOrderRepo for MemoryRepo {
    async fn get_by_order_id(&self, order_id: u64) -> anyhow::Result<Vec<ApplyOrder>> {
        let state = self.state();
        Ok(state.orders.values().filter(|el| el.order_id == order_id).cloned().collect())
    }

    async fn get_by_suborder_ids(
        &self,
        suborder_ids: &[String],
    ) -> anyhow::Result<Vec<ApplyOrder>> {
        let state = self.state();
        Ok(suborder_ids.iter().filter_map(|el| state.orders.get(el).cloned()).collect())
    }

    async fn get_dispatchable_ids(&self, limit: u64) -> anyhow::Result<Vec<String>> {
        let state = self.state();
        let mut orders = state.orders.values().filter(|el| el.is_dispatchable()).collect::<Vec<_>>();
        orders.sort_by_key(|el| el.update_at);
        Ok(orders
            .into_iter()
            .take(limit as usize)
            .map(|el| el.suborder_id.clone())
            .collect())
    }

    async fn update_immediately_with_filter(
        &self,
        filter: &OrderFilter,
        update: &OrderUpdate,
    ) -> anyhow::Result<UpdateOutcome> {
        let mut state = self.state();
        Ok(match state.orders.get_mut(&filter.suborder_id).filter(|el| filter.matches(el)) {
            Some(order) => {
                update.apply_to(order, Utc::now());
                UpdateOutcome::Applied
            }
            None => UpdateOutcome::Unmatched,
        })
    }

    async fn update_with_filter(
        &self,
        filter: &OrderFilter,
        update: &OrderUpdate,
    ) -> anyhow::Result<()> {
        self.push(PendingWrite::FilteredOrder(filter.clone(), update.clone()));
        Ok(())
    }
}

#[async_trait]
impl ReadOnlyRepository<ApplyStep> for MemoryRepo {
    async fn find_by_id(&self, id: &(String, StepName)) -> anyhow::Result<Option<ApplyStep>> {
        Ok(self.step(&id.0, id.1))
    }
}

#[async_trait]
impl MutableRepository<ApplyStep> for MemoryRepo {
    async fn update(&self, entity: &ApplyStep) -> anyhow::Result<()> {
        self.push(PendingWrite::UpdateStep(entity.clone()));
        Ok(())
    }

    async fn insert(&self, entity: &ApplyStep) -> anyhow::Result<(String, StepName)> {
        self.push(PendingWrite::InsertStep(entity.clone()));
        Ok((entity.suborder_id.clone(), entity.step_name))
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.commit()
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard();
        Ok(())
    }
}

impl DBRepository<ApplyStep> for MemoryRepo {}

#[async_trait]
impl ApplyStepRepo for MemoryRepo {
    async fn get_steps(&self, suborder_id: &str) -> anyhow::Result<Vec<ApplyStep>> {
        let mut steps = self.steps_of(suborder_id);
        steps.sort_by_key(|el| el.step_id);
        Ok(steps)
    }

    async fn insert_if_absent(&self, step: &ApplyStep) -> anyhow::Result<()> {
        self.push(PendingWrite::InsertStepIfAbsent(step.clone()));
        Ok(())
    }

    async fn update_immediately_with_filter(
        &self,
        filter: &StepFilter,
        update: &StepUpdate,
    ) -> anyhow::Result<UpdateOutcome> {
        let mut state = self.state();
        let key = (filter.suborder_id.clone(), filter.step_name);
        Ok(match state.steps.get_mut(&key).filter(|el| filter.matches(el)) {
            Some(step) => {
                update.apply_to(step);
                UpdateOutcome::Applied
            }
            None => UpdateOutcome::Unmatched,
        })
    }

    async fn update_with_filter(
        &self,
        filter: &StepFilter,
        update: &StepUpdate,
    ) -> anyhow::Result<()> {
        self.push(PendingWrite::FilteredStep(filter.clone(), update.clone()));
        Ok(())
    }
}

#[async_trait]
impl ReadOnlyRepository<ModifyRecord> for MemoryRepo {
    async fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<ModifyRecord>> {
        Ok(self.state().records.get(id).cloned())
    }
}

#[async_trait]
impl MutableRepository<ModifyRecord> for MemoryRepo {
    async fn update(&self, entity: &ModifyRecord) -> anyhow::Result<()> {
        self.push(PendingWrite::UpdateRecord(entity.clone()));
        Ok(())
    }

    async fn insert(&self, entity: &ModifyRecord) -> anyhow::Result<u64> {
        self.push(PendingWrite::InsertRecord(entity.clone()));
        Ok(entity.id)
    }

    async fn save_changed(&self) -> anyhow::Result<bool> {
        self.commit()
    }

    async fn discard_changed(&self) -> anyhow::Result<()> {
        self.discard();
        Ok(())
    }
}

impl DBRepository<ModifyRecord> for MemoryRepo {}

#[async_trait]
impl ModifyRecordRepo for MemoryRepo {
    async fn next_record_id(&self) -> anyhow::Result<u64> {
        let mut state = self.state();
        state.record_seq += 1;
        Ok(state.record_seq)
    }

    async fn get_by_suborder_id(&self, suborder_id: &str) -> anyhow::Result<Vec<ModifyRecord>> {
        Ok(self.records_of(suborder_id))
    }
}

#[async_trait]
impl ReadOnlyRepository<DeviceInfo> for MemoryRepo {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<DeviceInfo>> {
        Ok(self.device(*id))
    }
}

#[async_trait]
impl DeviceRepo for MemoryRepo {
    async fn count_unreleased(&self, suborder_id: &str) -> anyhow::Result<u32> {
        let state = self.state();
        Ok(state
            .devices
            .values()
            .filter(|el| el.suborder_id == suborder_id && !el.is_released)
            .count() as u32)
    }

    async fn get_undelivered(&self, suborder_id: &str) -> anyhow::Result<Vec<DeviceInfo>> {
        let state = self.state();
        Ok(state
            .devices
            .values()
            .filter(|el| el.suborder_id == suborder_id && !el.is_released && !el.is_delivered)
            .cloned()
            .collect())
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<DeviceInfo>> {
        let state = self.state();
        Ok(ids.iter().filter_map(|el| state.devices.get(el).cloned()).collect())
    }
}

#[async_trait]
impl ReadOnlyRepository<GenerateRecord> for MemoryRepo {
    async fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<GenerateRecord>> {
        Ok(self.generate_record(*id))
    }
}

#[async_trait]
impl GenerateRecordRepo for MemoryRepo {
    async fn get_by_suborder_id(&self, suborder_id: &str) -> anyhow::Result<Vec<GenerateRecord>> {
        let state = self.state();
        Ok(state
            .generate_records
            .values()
            .filter(|el| el.suborder_id == suborder_id)
            .cloned()
            .collect())
    }

    async fn reset_matched_immediately(&self, generate_ids: &[u64]) -> anyhow::Result<u64> {
        let mut state = self.state();
        let mut changed = 0;
        for id in generate_ids {
            if let Some(record) = state.generate_records.get_mut(id) {
                record.is_matched = false;
                record.update_at = Utc::now();
                changed += 1;
            }
        }
        Ok(changed)
    }
}
