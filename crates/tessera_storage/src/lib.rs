//! # TESSERA Storage
//!
//! Write-back persistence for the live world graph. Mutations are applied
//! in memory immediately; this crate decides what reaches durable storage,
//! when, and in what order.
//!
//! ## Design Principles
//!
//! 1. **Never block the tick** - the store is fire-and-forget; only its
//!    backlog depth is read, for backpressure
//! 2. **One queue slot per entity** - any number of mutations between two
//!    ticks costs one write
//! 3. **Deletes first, then inserts, then updates** - an update never
//!    targets a row that does not exist yet
//! 4. **Handles, not references** - a queued entity that was destroyed
//!    resolves to nothing and is dropped
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use tessera_storage::{Gauges, RecordingStore, StorageConfig, StorageManager};
//!
//! let manager = Arc::new(Mutex::new(StorageManager::new(
//!     StorageConfig::production(),
//!     RecordingStore::new(),
//!     Gauges::new(),
//! )));
//! world.add_observer(Box::new(Arc::clone(&manager)));
//!
//! // once per simulation tick
//! let report = manager.lock().tick(&mut world);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod contract;
pub mod encoding;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod queues;
pub mod state;
pub mod store;
pub mod throughput;

pub use config::{StorageConfig, DEFAULT_MAX_PENDING_QUERIES};
pub use contract::{EntityStore, LifecycleObserver, PersistentEntity};
pub use encoding::{encode_attribute, encode_location};
pub use error::{StorageError, StorageResult};
pub use manager::{StorageManager, TickReport};
pub use metrics::{Gauges, MetricsSink, NullSink};
pub use state::{AttributeState, CleanFacets, EntityPersistence, Phase, QueueSlot, Record};
pub use store::{
    AttributeBatch, BackingStore, EntityRow, MemoryBackend, RecordingStore, StoreBackend,
    StoreCall, StoreStats, StoredEntity, ThreadedStore, ThreadedStoreConfig,
};
pub use throughput::{QpsRing, Throughput, ThroughputSnapshot, QPS_WINDOW};
