//! # World Contracts
//!
//! What the persistence layer needs from the live world graph:
//!
//! - [`PersistentEntity`]: read identity/location, reach the persistence
//!   state, visit attributes
//! - [`EntityStore`]: resolve a handle, or nothing if the entity is gone
//! - [`LifecycleObserver`]: the notifications the world fires at the point
//!   of change

use std::sync::Arc;

use parking_lot::Mutex;
use tessera_core::{AttributeValue, EntityHandle, Quaternion, Vector3};

use crate::state::{AttributeState, EntityPersistence};

/// Accessor contract for an entity living in the world graph.
pub trait PersistentEntity {
    /// Handle of the slot this entity lives in.
    fn handle(&self) -> EntityHandle;

    /// Unique, stable identifier (the row key).
    fn id(&self) -> &str;

    /// Identifier of the containing location, `None` for the world root.
    fn container_id(&self) -> Option<&str>;

    /// Type name.
    fn type_name(&self) -> &str;

    /// Revision number, bumped on every mutation.
    fn seq(&self) -> u64;

    /// Position.
    fn position(&self) -> Vector3;

    /// Orientation, if the entity has one.
    fn orientation(&self) -> Option<Quaternion>;

    /// Persistence state.
    fn persistence(&self) -> &EntityPersistence;

    /// Persistence state, writable.
    fn persistence_mut(&mut self) -> &mut EntityPersistence;

    /// Visits every attribute in name order with its writable state.
    fn for_each_attribute(&mut self, visit: &mut dyn FnMut(&str, &AttributeValue, &mut AttributeState));
}

/// Handle resolution against the live world graph.
pub trait EntityStore {
    /// Concrete entity type.
    type Entity: PersistentEntity;

    /// Resolves a handle. Returns `None` once the entity has been destroyed,
    /// even if its slot has since been reused.
    fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Self::Entity>;
}

/// Receiver of world lifecycle notifications.
///
/// Both entry points are infallible from the caller's side.
pub trait LifecycleObserver {
    /// An entity was inserted into the world graph.
    fn entity_created(&mut self, entity: &mut dyn PersistentEntity);

    /// A tracked entity was mutated or destroyed.
    fn entity_updated(&mut self, entity: &mut dyn PersistentEntity);
}

impl<T: LifecycleObserver + ?Sized> LifecycleObserver for Arc<Mutex<T>> {
    fn entity_created(&mut self, entity: &mut dyn PersistentEntity) {
        self.lock().entity_created(entity);
    }

    fn entity_updated(&mut self, entity: &mut dyn PersistentEntity) {
        self.lock().entity_updated(entity);
    }
}
