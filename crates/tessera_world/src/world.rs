//! # World Graph
//!
//! Owns every live entity. Slots are reused through a free list; each
//! reuse bumps the slot's generation so handles taken earlier stop
//! resolving.
//!
//! Every mutation goes through the world, which fires the lifecycle
//! notifications at the point of change:
//!
//! - `spawn` → `entity_created`
//! - attribute/location change or destroy of a *tracked* entity →
//!   `entity_updated`
//!
//! Entities that have not been stored yet are not tracked; their changes
//! are picked up by the pending insert.

use std::collections::HashMap;

use tessera_core::{AttributeValue, EntityHandle, Quaternion, Vector3};
use tessera_storage::{EntityStore, LifecycleObserver, PersistentEntity};

use crate::entity::{Entity, EntityDescriptor};
use crate::error::{WorldError, WorldResult};

/// Identifier of the world root.
pub const ROOT_ID: &str = "0";

/// Type name of the world root.
pub const ROOT_TYPE: &str = "world";

struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// The live world graph.
pub struct World {
    slots: Vec<Slot>,
    /// Free list of slot indices for reuse.
    free_indices: Vec<u32>,
    ids: HashMap<String, EntityHandle>,
    root: EntityHandle,
    observers: Vec<Box<dyn LifecycleObserver>>,
}

impl World {
    /// Creates a world holding only its root.
    #[must_use]
    pub fn new() -> Self {
        let root = EntityHandle::new(0, 0);
        let entity = Entity::from_descriptor(root, None, EntityDescriptor::new(ROOT_ID, ROOT_TYPE));
        let mut ids = HashMap::new();
        ids.insert(ROOT_ID.to_owned(), root);
        Self {
            slots: vec![Slot {
                generation: 0,
                entity: Some(entity),
            }],
            free_indices: Vec::new(),
            ids,
            root,
            observers: Vec::new(),
        }
    }

    /// Registers a lifecycle observer.
    pub fn add_observer(&mut self, observer: Box<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    /// Handle of the world root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> EntityHandle {
        self.root
    }

    /// The world root, writable, for registering it with the storage layer.
    ///
    /// # Errors
    ///
    /// Never in practice: the root cannot be destroyed.
    pub fn root_mut(&mut self) -> WorldResult<&mut Entity> {
        self.slot_mut(self.root)
    }

    /// Number of live entities, root included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false once built: the root cannot be destroyed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Checks if a handle still refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets an entity by handle.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    /// Gets an entity by identifier.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Entity> {
        self.get(*self.ids.get(id)?)
    }

    /// Resolves an identifier to a handle.
    #[must_use]
    pub fn handle_of(&self, id: &str) -> Option<EntityHandle> {
        self.ids.get(id).copied()
    }

    /// Iterates live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    fn slot_mut(&mut self, handle: EntityHandle) -> WorldResult<&mut Entity> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entity.as_mut())
            .ok_or(WorldError::StaleHandle(handle))
    }

    /// Adds an entity to the world and announces it.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is taken or the container does
    /// not exist.
    pub fn spawn(&mut self, desc: EntityDescriptor) -> WorldResult<EntityHandle> {
        if self.ids.contains_key(&desc.id) {
            return Err(WorldError::DuplicateId(desc.id));
        }
        let container_id = desc.container.clone().unwrap_or_else(|| ROOT_ID.to_owned());
        let container = self
            .handle_of(&container_id)
            .ok_or_else(|| WorldError::UnknownContainer(container_id.clone()))?;

        let handle = match self.free_indices.pop() {
            Some(index) => EntityHandle::new(index, self.slots[index as usize].generation),
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| WorldError::Full)?;
                self.slots.push(Slot {
                    generation: 0,
                    entity: None,
                });
                EntityHandle::new(index, 0)
            }
        };
        self.slot_mut(container)?.add_content();

        let id = desc.id.clone();
        let entity = Entity::from_descriptor(handle, Some(container_id), desc);
        let slot = &mut self.slots[handle.index() as usize];
        let entity = slot.entity.insert(entity);
        self.ids.insert(id, handle);

        tracing::trace!("Spawned {} as {:?}", entity.id(), handle);
        for observer in &mut self.observers {
            observer.entity_created(&mut *entity);
        }
        Ok(handle)
    }

    /// Sets (or adds) an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StaleHandle`] if the entity is gone.
    pub fn set_attribute(
        &mut self,
        handle: EntityHandle,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> WorldResult<()> {
        self.mutate(handle, |entity| entity.set_attribute(name, value.into()))
    }

    /// Excludes an attribute from, or readmits it to, persistence.
    ///
    /// Returns `false` if the entity has no such attribute.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StaleHandle`] if the entity is gone.
    pub fn set_attribute_masked(
        &mut self,
        handle: EntityHandle,
        name: &str,
        masked: bool,
    ) -> WorldResult<bool> {
        Ok(self
            .slot_mut(handle)?
            .attribute_mut(name)
            .map(|attr| attr.set_masked(masked))
            .is_some())
    }

    /// Moves an entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StaleHandle`] if the entity is gone.
    pub fn move_entity(&mut self, handle: EntityHandle, position: Vector3) -> WorldResult<()> {
        self.mutate(handle, |entity| entity.move_to(position))
    }

    /// Rotates an entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StaleHandle`] if the entity is gone.
    pub fn rotate_entity(&mut self, handle: EntityHandle, orientation: Quaternion) -> WorldResult<()> {
        self.mutate(handle, |entity| entity.rotate_to(orientation))
    }

    fn mutate(&mut self, handle: EntityHandle, apply: impl FnOnce(&mut Entity)) -> WorldResult<()> {
        let index = handle.index() as usize;
        let entity = self
            .slots
            .get_mut(index)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entity.as_mut())
            .ok_or(WorldError::StaleHandle(handle))?;
        apply(entity);
        if entity.persistence().is_tracked() {
            for observer in &mut self.observers {
                observer.entity_updated(&mut *entity);
            }
        }
        Ok(())
    }

    /// Removes an entity from the world.
    ///
    /// A tracked entity is announced as destroyed first so its row can be
    /// deleted. The slot's generation is bumped before it is reused.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale, the entity is the world
    /// root, or it still contains other entities.
    pub fn destroy(&mut self, handle: EntityHandle) -> WorldResult<()> {
        if handle == self.root {
            return Err(WorldError::RootDestroy);
        }
        let entity = self.slot_mut(handle)?;
        if entity.contents() > 0 {
            return Err(WorldError::NotEmpty(entity.id().to_owned()));
        }

        let index = handle.index() as usize;
        let slot = &mut self.slots[index];
        let Some(mut entity) = slot.entity.take() else {
            return Err(WorldError::StaleHandle(handle));
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(handle.index());
        self.ids.remove(entity.id());

        if entity.persistence().is_tracked() {
            entity.persistence_mut().mark_destroyed();
            for observer in &mut self.observers {
                observer.entity_updated(&mut entity);
            }
        }

        if let Some(container) = entity.container_id().and_then(|id| self.handle_of(id)) {
            if let Ok(container) = self.slot_mut(container) {
                container.remove_content();
            }
        }
        tracing::trace!("Destroyed {} ({:?})", entity.id(), handle);
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for World {
    type Entity = Entity;

    fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.slot_mut(handle).ok()
    }
}
