//! # World Entities
//!
//! An entity is an identified, typed, located object holding named
//! attributes. Its persistence state rides along but is only ever changed
//! through the mark methods the storage layer exposes.

use std::collections::BTreeMap;

use tessera_core::{AttributeValue, EntityHandle, Quaternion, Vector3};
use tessera_storage::{AttributeState, EntityPersistence, PersistentEntity};

/// A named attribute: current value plus persistence state.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    value: AttributeValue,
    state: AttributeState,
}

impl Attribute {
    /// Creates a persisted attribute.
    #[must_use]
    pub fn new(value: AttributeValue) -> Self {
        Self {
            value,
            state: AttributeState::new(),
        }
    }

    /// Creates an attribute that is never persisted.
    #[must_use]
    pub fn ephemeral(value: AttributeValue) -> Self {
        Self {
            value,
            state: AttributeState::ephemeral(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Persistence state.
    #[must_use]
    pub fn state(&self) -> &AttributeState {
        &self.state
    }

    pub(crate) fn assign(&mut self, value: AttributeValue) {
        self.value = value;
        self.state.mark_dirty();
    }

    pub(crate) fn set_masked(&mut self, masked: bool) {
        self.state.set_masked(masked);
    }
}

/// Everything needed to spawn an entity.
///
/// ```rust,ignore
/// let desc = EntityDescriptor::new("42", "chest")
///     .at(Vector3::new(4.0, 0.0, 9.5))
///     .with_attribute("gold", 120)
///     .with_ephemeral_attribute("highlight", 1);
/// ```
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub(crate) id: String,
    pub(crate) type_name: String,
    pub(crate) container: Option<String>,
    pub(crate) position: Vector3,
    pub(crate) orientation: Option<Quaternion>,
    pub(crate) attributes: BTreeMap<String, Attribute>,
    pub(crate) ephemeral: bool,
}

impl EntityDescriptor {
    /// Describes an entity at the origin of the world root.
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            container: None,
            position: Vector3::ZERO,
            orientation: None,
            attributes: BTreeMap::new(),
            ephemeral: false,
        }
    }

    /// Places the entity inside another one instead of the world root.
    #[must_use]
    pub fn in_container(mut self, container_id: impl Into<String>) -> Self {
        self.container = Some(container_id.into());
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn at(mut self, position: Vector3) -> Self {
        self.position = position;
        self
    }

    /// Sets the orientation.
    #[must_use]
    pub fn facing(mut self, orientation: Quaternion) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Adds a persisted attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), Attribute::new(value.into()));
        self
    }

    /// Adds an attribute that is never persisted.
    #[must_use]
    pub fn with_ephemeral_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(name.into(), Attribute::ephemeral(value.into()));
        self
    }

    /// Marks the whole entity as never persisted.
    #[must_use]
    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

/// A live entity in the world graph.
#[derive(Debug)]
pub struct Entity {
    handle: EntityHandle,
    id: String,
    container_id: Option<String>,
    type_name: String,
    seq: u64,
    position: Vector3,
    orientation: Option<Quaternion>,
    attributes: BTreeMap<String, Attribute>,
    persistence: EntityPersistence,
    contents: usize,
}

impl Entity {
    pub(crate) fn from_descriptor(handle: EntityHandle, container_id: Option<String>, desc: EntityDescriptor) -> Self {
        Self {
            handle,
            id: desc.id,
            container_id,
            type_name: desc.type_name,
            seq: 0,
            position: desc.position,
            orientation: desc.orientation,
            attributes: desc.attributes,
            persistence: if desc.ephemeral {
                EntityPersistence::ephemeral()
            } else {
                EntityPersistence::new()
            },
            contents: 0,
        }
    }

    /// Handle of this entity.
    #[must_use]
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Containing entity's identifier, `None` for the world root.
    #[must_use]
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// Type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Revision number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Position.
    #[must_use]
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Orientation, if set.
    #[must_use]
    pub fn orientation(&self) -> Option<Quaternion> {
        self.orientation
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    /// Persistence state.
    #[must_use]
    pub fn persistence(&self) -> &EntityPersistence {
        &self.persistence
    }

    /// Number of entities directly inside this one.
    #[must_use]
    pub fn contents(&self) -> usize {
        self.contents
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: AttributeValue) {
        match self.attributes.get_mut(name) {
            Some(attr) => attr.assign(value),
            None => {
                self.attributes.insert(name.to_owned(), Attribute::new(value));
            }
        }
        self.seq += 1;
        self.persistence.mark_dirty();
    }

    pub(crate) fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    pub(crate) fn move_to(&mut self, position: Vector3) {
        self.position = position;
        self.seq += 1;
        self.persistence.mark_moved();
    }

    pub(crate) fn rotate_to(&mut self, orientation: Quaternion) {
        self.orientation = Some(orientation);
        self.seq += 1;
        self.persistence.mark_rotated();
    }

    pub(crate) fn add_content(&mut self) {
        self.contents += 1;
    }

    pub(crate) fn remove_content(&mut self) {
        self.contents = self.contents.saturating_sub(1);
    }
}

impl PersistentEntity for Entity {
    fn handle(&self) -> EntityHandle {
        self.handle
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn seq(&self) -> u64 {
        self.seq
    }

    fn position(&self) -> Vector3 {
        self.position
    }

    fn orientation(&self) -> Option<Quaternion> {
        self.orientation
    }

    fn persistence(&self) -> &EntityPersistence {
        &self.persistence
    }

    fn persistence_mut(&mut self) -> &mut EntityPersistence {
        &mut self.persistence
    }

    fn for_each_attribute(&mut self, visit: &mut dyn FnMut(&str, &AttributeValue, &mut AttributeState)) {
        for (name, attr) in &mut self.attributes {
            visit(name, &attr.value, &mut attr.state);
        }
    }
}
