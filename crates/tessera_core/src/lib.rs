//! # TESSERA Core
//!
//! Types shared by the live world graph and the persistence layer:
//!
//! - [`EntityHandle`]: index + generation, the only reference the
//!   persistence layer ever keeps to an entity
//! - [`Vector3`] / [`Quaternion`]: entity location
//! - [`AttributeValue`]: the value held by a named entity attribute
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{AttributeValue, EntityHandle, Vector3};
//!
//! let handle = EntityHandle::new(7, 2);
//! assert_eq!(handle.index(), 7);
//!
//! let hp = AttributeValue::from(10);
//! let pos = Vector3::new(1.0, 0.0, -4.5);
//! # let _ = (hp, pos);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod math;
pub mod value;

pub use entity::EntityHandle;
pub use math::{Quaternion, Vector3};
pub use value::AttributeValue;
