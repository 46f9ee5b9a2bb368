//! # Entity Handles
//!
//! Entities are referenced by lightweight handles consisting of:
//! - An index into the world's slot array
//! - A generation counter for safe slot reuse
//!
//! The world bumps a slot's generation when the entity living there is
//! destroyed, so every handle taken before the destruction stops resolving.
//! That comparison is the whole liveness check.

use std::fmt;

/// Generation-checked reference to an entity slot.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the slot array
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Null/invalid handle.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a new handle from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The slot index (0 to 2^32-1)
    /// * `generation` - The generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this handle is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the raw packed representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("EntityHandle(null)");
        }
        write!(f, "EntityHandle({}v{})", self.index(), self.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_roundtrip() {
        let handle = EntityHandle::new(12345, 67890);
        assert_eq!(handle.index(), 12345);
        assert_eq!(handle.generation(), 67890);
        assert!(!handle.is_null());
    }

    #[test]
    fn test_generation_distinguishes_reused_slot() {
        let old = EntityHandle::new(3, 0);
        let new = EntityHandle::new(3, 1);
        assert_ne!(old, new);
        assert_eq!(old.index(), new.index());
    }

    #[test]
    fn test_default_is_null() {
        assert!(EntityHandle::default().is_null());
        assert_eq!(format!("{:?}", EntityHandle::NULL), "EntityHandle(null)");
        assert_eq!(format!("{:?}", EntityHandle::new(4, 9)), "EntityHandle(4v9)");
    }
}
