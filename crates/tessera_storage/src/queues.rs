//! # Write-Back Queues
//!
//! Three FIFO lists of pending work:
//!
//! - creation: handles of entities waiting for their first insert
//! - dirty: handles of persisted entities waiting for an update
//! - destroyed: identifiers of rows to delete
//!
//! Handles are weak: an entry whose entity has since been destroyed is
//! dropped when drained rather than searched for and removed here.

use std::collections::VecDeque;

use tessera_core::EntityHandle;

/// The three pending-work queues.
#[derive(Debug, Default)]
pub struct WriteBackQueues {
    creation: VecDeque<EntityHandle>,
    dirty: VecDeque<EntityHandle>,
    destroyed: VecDeque<String>,
}

impl WriteBackQueues {
    /// Creates empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the creation queue.
    pub fn push_created(&mut self, handle: EntityHandle) {
        self.creation.push_back(handle);
    }

    /// Appends to the dirty queue.
    pub fn push_dirty(&mut self, handle: EntityHandle) {
        self.dirty.push_back(handle);
    }

    /// Appends to the destroyed queue.
    pub fn push_destroyed(&mut self, id: String) {
        self.destroyed.push_back(id);
    }

    /// Takes the oldest creation entry.
    pub fn pop_created(&mut self) -> Option<EntityHandle> {
        self.creation.pop_front()
    }

    /// Takes the oldest dirty entry.
    pub fn pop_dirty(&mut self) -> Option<EntityHandle> {
        self.dirty.pop_front()
    }

    /// Takes the oldest destroyed identifier.
    pub fn pop_destroyed(&mut self) -> Option<String> {
        self.destroyed.pop_front()
    }

    /// Entries waiting for insert.
    #[must_use]
    pub fn created_len(&self) -> usize {
        self.creation.len()
    }

    /// Entries waiting for update.
    #[must_use]
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Rows waiting for delete.
    #[must_use]
    pub fn destroyed_len(&self) -> usize {
        self.destroyed.len()
    }

    /// Dirty queue contents, oldest first.
    pub fn dirty_handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.dirty.iter().copied()
    }

    /// True when no work is pending anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creation.is_empty() && self.dirty.is_empty() && self.destroyed.is_empty()
    }
}
