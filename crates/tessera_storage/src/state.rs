//! # Persistence State
//!
//! Per-entity and per-attribute state that answers "does this need
//! persisting, and how".
//!
//! The world graph embeds these values in its entities but can only read
//! them or report changes (`mark_dirty`, `mark_moved`, `mark_destroyed`, ...).
//! Queueing, tracking and clean/seen transitions are `pub(crate)`: only the
//! storage manager performs them.

/// Which write-back queue holds an entity's single outstanding entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueSlot {
    /// Waiting for its first insert.
    Creation,
    /// Waiting for an update.
    Dirty,
}

/// Lifecycle phase of an entity, as seen by the persistence layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Never persisted.
    Ephemeral,
    /// Live and not in any queue.
    Idle,
    /// Exactly one queue entry outstanding.
    Queued(QueueSlot),
}

/// Bitmask of entity facets that match durable storage.
///
/// 1 = clean, 0 = something pending for that facet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CleanFacets(u8);

impl CleanFacets {
    /// The entity row as a whole.
    pub const ENTITY: u8 = 1 << 0;
    /// The position part of the location.
    pub const POSITION: u8 = 1 << 1;
    /// The orientation part of the location.
    pub const ORIENTATION: u8 = 1 << 2;
    /// Everything.
    pub const ALL: Self = Self(Self::ENTITY | Self::POSITION | Self::ORIENTATION);
    /// Nothing clean.
    pub const NONE: Self = Self(0);

    /// Checks whether every facet in `mask` is clean.
    #[inline]
    #[must_use]
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// Marks the facets in `mask` clean.
    #[inline]
    pub fn insert(&mut self, mask: u8) {
        self.0 |= mask;
    }

    /// Marks the facets in `mask` dirty.
    #[inline]
    pub fn remove(&mut self, mask: u8) {
        self.0 &= !mask;
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Persistence state carried by every entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityPersistence {
    phase: Phase,
    clean: CleanFacets,
    tracked: bool,
    destroyed: bool,
}

impl EntityPersistence {
    /// State of a freshly created, persistable entity.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            clean: CleanFacets::NONE,
            tracked: false,
            destroyed: false,
        }
    }

    /// State of an entity that must never be persisted.
    #[must_use]
    pub const fn ephemeral() -> Self {
        Self {
            phase: Phase::Ephemeral,
            clean: CleanFacets::NONE,
            tracked: false,
            destroyed: false,
        }
    }

    /// Current phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Never persisted.
    #[inline]
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self.phase, Phase::Ephemeral)
    }

    /// Has an outstanding queue entry.
    #[inline]
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self.phase, Phase::Queued(_))
    }

    /// Queue currently holding this entity, if any.
    #[inline]
    #[must_use]
    pub const fn queue_slot(&self) -> Option<QueueSlot> {
        match self.phase {
            Phase::Queued(slot) => Some(slot),
            _ => None,
        }
    }

    /// Removed from the world graph.
    #[inline]
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Persisted at least once; mutations must be reported to the
    /// storage layer from now on.
    #[inline]
    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// Nothing pending for the entity row.
    #[inline]
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.clean.contains(CleanFacets::ENTITY)
    }

    /// Stored position is current.
    #[inline]
    #[must_use]
    pub const fn is_position_clean(&self) -> bool {
        self.clean.contains(CleanFacets::POSITION)
    }

    /// Stored orientation is current.
    #[inline]
    #[must_use]
    pub const fn is_orientation_clean(&self) -> bool {
        self.clean.contains(CleanFacets::ORIENTATION)
    }

    /// Reports a mutation of the entity's attributes or identity.
    pub fn mark_dirty(&mut self) {
        self.clean.remove(CleanFacets::ENTITY);
    }

    /// Reports a position change.
    pub fn mark_moved(&mut self) {
        self.clean.remove(CleanFacets::ENTITY | CleanFacets::POSITION);
    }

    /// Reports an orientation change.
    pub fn mark_rotated(&mut self) {
        self.clean.remove(CleanFacets::ENTITY | CleanFacets::ORIENTATION);
    }

    /// Reports removal from the world graph.
    ///
    /// The queue slot is left alone; the storage manager discards the
    /// outstanding entry when it drains it.
    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    pub(crate) fn enqueue(&mut self, slot: QueueSlot) {
        debug_assert!(
            matches!(self.phase, Phase::Idle),
            "enqueue from {:?}",
            self.phase
        );
        self.phase = Phase::Queued(slot);
    }

    /// Row written: clean everywhere, out of the queue, mutations tracked.
    pub(crate) fn mark_stored(&mut self) {
        if self.is_queued() {
            self.phase = Phase::Idle;
        }
        self.clean = CleanFacets::ALL;
        self.tracked = true;
    }

    /// Queue entry consumed without a write; the next mutation requeues.
    pub(crate) fn release(&mut self) {
        if self.is_queued() {
            self.phase = Phase::Idle;
        }
    }
}

impl Default for EntityPersistence {
    fn default() -> Self {
        Self::new()
    }
}

/// Durable record status of one attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Record {
    /// Never written; the next persist inserts it.
    Unseen,
    /// Written at least once; later persists update it.
    Seen {
        /// Matches the stored value.
        clean: bool,
    },
}

/// Persistence state carried by every attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeState {
    record: Record,
    ephemeral: bool,
    masked: bool,
}

impl AttributeState {
    /// State of a new persistable attribute.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            record: Record::Unseen,
            ephemeral: false,
            masked: false,
        }
    }

    /// State of an attribute that is never persisted.
    #[must_use]
    pub const fn ephemeral() -> Self {
        Self {
            record: Record::Unseen,
            ephemeral: true,
            masked: false,
        }
    }

    /// Durable record status.
    #[inline]
    #[must_use]
    pub const fn record(&self) -> Record {
        self.record
    }

    /// Excluded from persistence entirely.
    #[inline]
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Excluded from the current revision (computed or re-derived value).
    #[inline]
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        self.masked
    }

    /// Written at least once.
    #[inline]
    #[must_use]
    pub const fn is_seen(&self) -> bool {
        matches!(self.record, Record::Seen { .. })
    }

    /// Matches the stored value.
    #[inline]
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self.record, Record::Seen { clean: true })
    }

    /// Neither ephemeral nor masked.
    #[inline]
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        !self.ephemeral && !self.masked
    }

    /// Reports a value change.
    pub fn mark_dirty(&mut self) {
        if let Record::Seen { clean } = &mut self.record {
            *clean = false;
        }
    }

    /// Sets or clears the "do not persist this revision" mask.
    pub fn set_masked(&mut self, masked: bool) {
        self.masked = masked;
    }

    /// Value written. `Unseen` becomes `Seen` here and never goes back.
    pub(crate) fn mark_persisted(&mut self) {
        self.record = Record::Seen { clean: true };
    }
}

impl Default for AttributeState {
    fn default() -> Self {
        Self::new()
    }
}
