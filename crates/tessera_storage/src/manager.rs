//! # Storage Manager
//!
//! The write-back scheduler. The world graph reports changes through
//! [`LifecycleObserver`]; once per simulation tick [`StorageManager::tick`]
//! drains the queues into the backing store:
//!
//! ```text
//! 1. destroyed  ─► drop_entity            (always fully drained)
//! 2. creation   ─► insert_entity + attrs  (always fully drained)
//! 3. dirty      ─► update_entity + attrs  (until the store backlog is too deep)
//! ```
//!
//! Queue entries are handles, not references. An entity destroyed while
//! queued resolves to nothing at drain time and its entry is dropped.

use tessera_core::EntityHandle;

use crate::config::StorageConfig;
use crate::contract::{EntityStore, LifecycleObserver, PersistentEntity};
use crate::encoding::{encode_attribute, encode_location};
use crate::metrics::{publish, Gauges, MetricsSink};
use crate::queues::WriteBackQueues;
use crate::state::QueueSlot;
use crate::store::{AttributeBatch, BackingStore, EntityRow};
use crate::throughput::{Throughput, ThroughputSnapshot};

/// What one [`StorageManager::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entity rows deleted.
    pub deleted: usize,
    /// Entities inserted.
    pub inserted: usize,
    /// Entities updated.
    pub updated: usize,
    /// Queue entries whose entity no longer existed.
    pub stale: usize,
    /// Dirty entries left for a later tick.
    pub deferred: usize,
    /// The dirty drain stopped on store backpressure.
    pub throttled: bool,
    /// Insert queries issued (entity + attribute rows).
    pub insert_queries: u64,
    /// Update queries issued (entity + attribute rows).
    pub update_queries: u64,
}

/// Decides what gets persisted, when, and in what order.
pub struct StorageManager<S: BackingStore, M: MetricsSink = Gauges> {
    config: StorageConfig,
    store: S,
    metrics: M,
    queues: WriteBackQueues,
    throughput: Throughput,
}

impl<S: BackingStore, M: MetricsSink> StorageManager<S, M> {
    /// Creates a manager writing to `store` and reporting to `metrics`.
    ///
    /// All gauges are published (as zero) immediately.
    pub fn new(config: StorageConfig, store: S, metrics: M) -> Self {
        let mut manager = Self {
            config,
            store,
            metrics,
            queues: WriteBackQueues::new(),
            throughput: Throughput::new(),
        };
        manager.publish_metrics();
        manager
    }

    /// Registers the world root, whose row the store already holds.
    ///
    /// The root is marked clean and tracked without being queued, so its
    /// later mutations take the update path.
    pub fn init_world(&mut self, root: &mut dyn PersistentEntity) {
        if !self.config.enabled {
            return;
        }
        root.persistence_mut().mark_stored();
        tracing::debug!("World root {} registered", root.id());
    }

    /// Runs one write-back cycle against `world`.
    pub fn tick<W: EntityStore + ?Sized>(&mut self, world: &mut W) -> TickReport {
        let mut report = TickReport::default();
        if !self.config.enabled {
            return report;
        }

        let inserts_before = self.throughput.insert_queries();
        let updates_before = self.throughput.update_queries();

        while let Some(id) = self.queues.pop_destroyed() {
            tracing::debug!("Dropping entity {}", id);
            self.store.drop_entity(&id);
            report.deleted += 1;
        }

        while let Some(handle) = self.queues.pop_created() {
            match world.entity_mut(handle) {
                Some(entity) if !entity.persistence().is_destroyed() => {
                    if self.insert_entity(entity) {
                        report.inserted += 1;
                    }
                }
                _ => {
                    tracing::debug!("Stale creation entry {:?} dropped", handle);
                    report.stale += 1;
                }
            }
        }

        while self.queues.dirty_len() > 0 {
            let pending = self.store.pending_queries();
            if pending > self.config.max_pending_queries {
                report.throttled = true;
                report.deferred = self.queues.dirty_len();
                tracing::warn!(
                    "Store backlog {} over {}, deferring {} updates",
                    pending,
                    self.config.max_pending_queries,
                    report.deferred
                );
                break;
            }
            let Some(handle) = self.queues.pop_dirty() else {
                break;
            };
            match world.entity_mut(handle) {
                Some(entity) if !entity.persistence().is_destroyed() => {
                    if self.update_entity(entity) {
                        report.updated += 1;
                    }
                }
                _ => {
                    tracing::debug!("Stale dirty entry {:?} dropped", handle);
                    report.stale += 1;
                }
            }
        }

        let (insert_queries, update_queries) =
            self.throughput.close_tick(inserts_before, updates_before);
        report.insert_queries = insert_queries;
        report.update_queries = update_queries;
        if insert_queries > 0 || update_queries > 0 {
            tracing::debug!("Storage I:{} U:{}", insert_queries, update_queries);
        }

        self.publish_metrics();
        report
    }

    /// Writes a new entity row and all of its persistable attributes.
    fn insert_entity<E: PersistentEntity + ?Sized>(&mut self, entity: &mut E) -> bool {
        let location = match encode_location(entity.position(), entity.orientation()) {
            Ok(location) => location,
            Err(err) => {
                tracing::warn!("Entity {} not stored: {}", entity.id(), err);
                entity.persistence_mut().release();
                return false;
            }
        };

        let id = entity.id().to_owned();
        self.store.insert_entity(EntityRow {
            id: id.clone(),
            container_id: entity.container_id().map(str::to_owned),
            type_name: entity.type_name().to_owned(),
            seq: entity.seq(),
            location,
        });
        self.throughput.entity_inserts += 1;

        let mut batch = AttributeBatch::new();
        entity.for_each_attribute(&mut |name, value, state| {
            if !state.is_persistable() {
                return;
            }
            match encode_attribute(name, value) {
                Ok(encoded) => {
                    batch.insert(name.to_owned(), encoded);
                    state.mark_persisted();
                }
                Err(err) => tracing::warn!("Attribute {}.{} skipped: {}", id, name, err),
            }
        });

        let rows = batch.len();
        if !batch.is_empty() {
            self.store.insert_attributes(&id, batch);
            self.throughput.attribute_inserts += rows as u64;
        }

        entity.persistence_mut().mark_stored();
        tracing::debug!("Stored entity {} ({} attributes)", id, rows);
        true
    }

    /// Rewrites a persisted entity's location and its attributes.
    ///
    /// Attributes never written before are inserted, the rest updated.
    fn update_entity<E: PersistentEntity + ?Sized>(&mut self, entity: &mut E) -> bool {
        let location = match encode_location(entity.position(), entity.orientation()) {
            Ok(location) => location,
            Err(err) => {
                tracing::warn!("Entity {} not updated: {}", entity.id(), err);
                entity.persistence_mut().release();
                return false;
            }
        };

        let id = entity.id().to_owned();
        self.store.update_entity(&id, entity.seq(), location);
        self.throughput.entity_updates += 1;

        let mut fresh = AttributeBatch::new();
        let mut changed = AttributeBatch::new();
        entity.for_each_attribute(&mut |name, value, state| {
            if !state.is_persistable() {
                return;
            }
            match encode_attribute(name, value) {
                Ok(encoded) => {
                    if state.is_seen() {
                        changed.insert(name.to_owned(), encoded);
                    } else {
                        fresh.insert(name.to_owned(), encoded);
                    }
                    state.mark_persisted();
                }
                Err(err) => tracing::warn!("Attribute {}.{} skipped: {}", id, name, err),
            }
        });

        let (inserted, updated) = (fresh.len(), changed.len());
        if !fresh.is_empty() {
            self.store.insert_attributes(&id, fresh);
            self.throughput.attribute_inserts += inserted as u64;
        }
        if !changed.is_empty() {
            self.store.update_attributes(&id, changed);
            self.throughput.attribute_updates += updated as u64;
        }

        entity.persistence_mut().mark_stored();
        tracing::debug!(
            "Updated entity {} ({} new, {} changed attributes)",
            id,
            inserted,
            updated
        );
        true
    }

    fn publish_metrics(&mut self) {
        publish(&mut self.metrics, &self.throughput.snapshot());
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Backing store, writable.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes the manager, handing back the store for shutdown.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Metrics sink.
    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Current throughput figures.
    pub fn throughput(&self) -> ThroughputSnapshot {
        self.throughput.snapshot()
    }

    /// Entities waiting for their first insert.
    pub fn pending_creates(&self) -> usize {
        self.queues.created_len()
    }

    /// Entities waiting for an update.
    pub fn pending_updates(&self) -> usize {
        self.queues.dirty_len()
    }

    /// Identifiers waiting for deletion.
    pub fn pending_deletes(&self) -> usize {
        self.queues.destroyed_len()
    }

    /// Dirty queue contents, oldest first.
    pub fn dirty_queue_handles(&self) -> Vec<EntityHandle> {
        self.queues.dirty_handles().collect()
    }
}

impl<S: BackingStore, M: MetricsSink> LifecycleObserver for StorageManager<S, M> {
    fn entity_created(&mut self, entity: &mut dyn PersistentEntity) {
        if !self.config.enabled {
            return;
        }
        let handle = entity.handle();
        let state = entity.persistence_mut();
        if state.is_ephemeral() || state.is_queued() || state.is_destroyed() {
            return;
        }
        state.enqueue(QueueSlot::Creation);
        self.queues.push_created(handle);
    }

    fn entity_updated(&mut self, entity: &mut dyn PersistentEntity) {
        if !self.config.enabled {
            return;
        }
        let handle = entity.handle();
        let state = entity.persistence();
        if state.is_destroyed() {
            if state.is_tracked() {
                self.queues.push_destroyed(entity.id().to_owned());
            }
            return;
        }
        if state.is_ephemeral() || state.is_queued() {
            return;
        }
        // No row exists until the first insert.
        if !state.is_tracked() {
            tracing::debug!("Update for unstored entity {} ignored", entity.id());
            return;
        }
        entity.persistence_mut().enqueue(QueueSlot::Dirty);
        self.queues.push_dirty(handle);
    }
}
