//! # TESSERA World
//!
//! The live world graph: entities with named attributes, nested inside
//! containers under a single root, addressed by generational handles.
//!
//! The world owns its entities and fires lifecycle notifications at the
//! point of change. The persistence layer subscribes as an observer and
//! resolves its queued handles back through [`World`] at drain time.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_world::{EntityDescriptor, World};
//!
//! let mut world = World::new();
//! let chest = world.spawn(EntityDescriptor::new("42", "chest").with_attribute("gold", 120))?;
//! world.set_attribute(chest, "gold", 80)?;
//! world.destroy(chest)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod world;

pub use entity::{Attribute, EntityDescriptor, Entity};
pub use error::{WorldError, WorldResult};
pub use world::{World, ROOT_ID, ROOT_TYPE};
