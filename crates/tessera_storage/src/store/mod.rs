//! # Backing Store Contract
//!
//! The store is an opaque asynchronous service. The write-back layer hands
//! it calls and never waits for them; the only thing it reads back is the
//! backlog size ([`BackingStore::pending_queries`]) used for backpressure.
//!
//! Implementations shipped here:
//!
//! - [`RecordingStore`]: records every call in order, backlog set by hand
//! - [`ThreadedStore`]: writer thread behind a channel, applying calls to
//!   a [`StoreBackend`] such as [`MemoryBackend`]

mod memory;
mod recording;
mod threaded;

use std::collections::BTreeMap;

pub use memory::{MemoryBackend, StoredEntity};
pub use recording::RecordingStore;
pub use threaded::{StoreStats, ThreadedStore, ThreadedStoreConfig};

use crate::error::StorageResult;

/// Attribute name → serialized value, ordered by name.
pub type AttributeBatch = BTreeMap<String, String>;

/// One entity row as inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRow {
    /// Row key.
    pub id: String,
    /// Containing location's key, `None` for the world root.
    pub container_id: Option<String>,
    /// Type name.
    pub type_name: String,
    /// Revision number.
    pub seq: u64,
    /// Encoded location blob.
    pub location: String,
}

/// A single call issued to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    /// Insert an entity row.
    InsertEntity(EntityRow),
    /// Rewrite an entity's revision and location.
    UpdateEntity {
        /// Row key.
        id: String,
        /// Revision number.
        seq: u64,
        /// Encoded location blob.
        location: String,
    },
    /// Delete an entity row.
    DropEntity {
        /// Row key.
        id: String,
    },
    /// Insert attribute rows for one entity.
    InsertAttributes {
        /// Owning entity key.
        entity_id: String,
        /// Rows to insert.
        batch: AttributeBatch,
    },
    /// Update attribute rows for one entity.
    UpdateAttributes {
        /// Owning entity key.
        entity_id: String,
        /// Rows to update.
        batch: AttributeBatch,
    },
}

impl StoreCall {
    /// Entity key this call targets.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::InsertEntity(row) => &row.id,
            Self::UpdateEntity { id, .. } | Self::DropEntity { id } => id,
            Self::InsertAttributes { entity_id, .. } | Self::UpdateAttributes { entity_id, .. } => {
                entity_id
            }
        }
    }
}

/// Call contract of the backing store.
///
/// Calls are fire-and-forget. A failing call is the store's problem to
/// report; it must not panic back into the simulation tick.
pub trait BackingStore {
    /// Inserts an entity row.
    fn insert_entity(&mut self, row: EntityRow);

    /// Rewrites an entity's revision and location.
    fn update_entity(&mut self, id: &str, seq: u64, location: String);

    /// Deletes an entity row.
    fn drop_entity(&mut self, id: &str);

    /// Inserts a batch of attribute rows.
    fn insert_attributes(&mut self, entity_id: &str, batch: AttributeBatch);

    /// Updates a batch of attribute rows.
    fn update_attributes(&mut self, entity_id: &str, batch: AttributeBatch);

    /// Calls accepted but not yet executed.
    fn pending_queries(&self) -> usize;
}

/// Something that actually executes store calls.
pub trait StoreBackend {
    /// Executes one call.
    ///
    /// # Errors
    ///
    /// Returns an error if the call cannot be applied, e.g. an update for a
    /// row that does not exist.
    fn apply(&mut self, call: StoreCall) -> StorageResult<()>;
}
