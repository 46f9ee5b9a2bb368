//! Synchronous store that remembers every call, for tests and dry runs.

use super::{AttributeBatch, BackingStore, EntityRow, StoreCall};

/// Records calls in issue order. The reported backlog is whatever was set.
#[derive(Clone, Debug, Default)]
pub struct RecordingStore {
    calls: Vec<StoreCall>,
    pending: usize,
}

impl RecordingStore {
    /// Creates a store reporting an empty backlog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store reporting a fixed backlog.
    #[must_use]
    pub fn with_pending(pending: usize) -> Self {
        Self {
            calls: Vec::new(),
            pending,
        }
    }

    /// Changes the reported backlog.
    pub fn set_pending(&mut self, pending: usize) {
        self.pending = pending;
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    /// Takes the recorded calls, leaving the log empty.
    pub fn take_calls(&mut self) -> Vec<StoreCall> {
        std::mem::take(&mut self.calls)
    }

    /// Calls targeting one entity, oldest first.
    pub fn calls_for<'a>(&'a self, entity_id: &'a str) -> impl Iterator<Item = &'a StoreCall> + 'a {
        self.calls.iter().filter(move |call| call.entity_id() == entity_id)
    }
}

impl BackingStore for RecordingStore {
    fn insert_entity(&mut self, row: EntityRow) {
        self.calls.push(StoreCall::InsertEntity(row));
    }

    fn update_entity(&mut self, id: &str, seq: u64, location: String) {
        self.calls.push(StoreCall::UpdateEntity {
            id: id.to_owned(),
            seq,
            location,
        });
    }

    fn drop_entity(&mut self, id: &str) {
        self.calls.push(StoreCall::DropEntity { id: id.to_owned() });
    }

    fn insert_attributes(&mut self, entity_id: &str, batch: AttributeBatch) {
        self.calls.push(StoreCall::InsertAttributes {
            entity_id: entity_id.to_owned(),
            batch,
        });
    }

    fn update_attributes(&mut self, entity_id: &str, batch: AttributeBatch) {
        self.calls.push(StoreCall::UpdateAttributes {
            entity_id: entity_id.to_owned(),
            batch,
        });
    }

    fn pending_queries(&self) -> usize {
        self.pending
    }
}
