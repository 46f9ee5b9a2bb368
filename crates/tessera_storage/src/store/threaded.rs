//! # Threaded Store
//!
//! A writer thread drains store calls from a channel and applies them to a
//! [`StoreBackend`]. Callers never block: every call is queued and counted
//! in the backlog until the writer has executed it.
//!
//! ```text
//! tick ──► Sender<Command> ──► writer thread ──► StoreBackend::apply
//!              │                     │
//!              └── pending += 1      └── pending -= 1, stats
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::Deserialize;

use super::{AttributeBatch, BackingStore, EntityRow, StoreBackend, StoreCall};
use crate::error::{StorageError, StorageResult};

/// Writer thread configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadedStoreConfig {
    /// Artificial per-call latency in microseconds, 0 for none.
    ///
    /// Lets a demo server build up a real backlog.
    pub write_delay_us: u64,
}

/// Writer thread counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Calls the backend executed.
    pub applied: u64,
    /// Calls the backend rejected.
    pub failed: u64,
    /// Calls that never reached the writer because it had stopped.
    pub rejected: u64,
}

enum Command {
    Call(StoreCall),
    Flush(Sender<()>),
}

/// Store that executes calls on a dedicated writer thread.
pub struct ThreadedStore<B: StoreBackend + Send + 'static> {
    sender: Option<Sender<Command>>,
    pending: Arc<AtomicUsize>,
    stats: Arc<Mutex<StoreStats>>,
    writer_handle: Option<JoinHandle<B>>,
}

impl<B: StoreBackend + Send + 'static> ThreadedStore<B> {
    /// Starts the writer thread over `backend`.
    pub fn spawn(backend: B, config: ThreadedStoreConfig) -> Self {
        let (sender, receiver) = unbounded();
        let pending = Arc::new(AtomicUsize::new(0));
        let stats = Arc::new(Mutex::new(StoreStats::default()));

        let writer_pending = Arc::clone(&pending);
        let writer_stats = Arc::clone(&stats);
        let writer_handle = thread::spawn(move || {
            Self::writer_loop(backend, &receiver, &writer_pending, &writer_stats, &config)
        });

        Self {
            sender: Some(sender),
            pending,
            stats,
            writer_handle: Some(writer_handle),
        }
    }

    fn writer_loop(
        mut backend: B,
        receiver: &Receiver<Command>,
        pending: &AtomicUsize,
        stats: &Mutex<StoreStats>,
        config: &ThreadedStoreConfig,
    ) -> B {
        tracing::info!("Store writer started (write delay {}us)", config.write_delay_us);
        let delay = Duration::from_micros(config.write_delay_us);

        while let Ok(command) = receiver.recv() {
            match command {
                Command::Call(call) => {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    let entity_id = call.entity_id().to_owned();
                    let result = backend.apply(call);
                    pending.fetch_sub(1, Ordering::AcqRel);

                    let mut s = stats.lock();
                    match result {
                        Ok(()) => s.applied += 1,
                        Err(err) => {
                            s.failed += 1;
                            tracing::error!("Store call for {} failed: {}", entity_id, err);
                        }
                    }
                }
                Command::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        tracing::info!("Store writer stopped");
        backend
    }

    fn submit(&self, call: StoreCall) {
        let Some(sender) = &self.sender else {
            self.stats.lock().rejected += 1;
            return;
        };
        self.pending.fetch_add(1, Ordering::AcqRel);
        if sender.send(Command::Call(call)).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            self.stats.lock().rejected += 1;
            tracing::error!("Store writer gone, call dropped");
        }
    }

    /// Blocks until every call queued so far has been executed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::StoreClosed`] if the writer has stopped.
    pub fn flush(&self) -> StorageResult<()> {
        let sender = self.sender.as_ref().ok_or(StorageError::StoreClosed)?;
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        sender
            .send(Command::Flush(done_tx))
            .map_err(|_| StorageError::StoreClosed)?;
        done_rx.recv().map_err(|_| StorageError::StoreClosed)
    }

    /// Returns current statistics.
    pub fn stats(&self) -> StoreStats {
        *self.stats.lock()
    }

    /// Drains the queue, stops the writer and hands back the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::StoreClosed`] if the writer thread panicked.
    pub fn shutdown(mut self) -> StorageResult<B> {
        self.sender = None;
        let handle = self.writer_handle.take().ok_or(StorageError::StoreClosed)?;
        handle.join().map_err(|_| StorageError::StoreClosed)
    }
}

impl<B: StoreBackend + Send + 'static> Drop for ThreadedStore<B> {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop once it is drained.
        self.sender = None;
        if let Some(handle) = self.writer_handle.take() {
            let _ = handle.join();
        }
    }
}

impl<B: StoreBackend + Send + 'static> BackingStore for ThreadedStore<B> {
    fn insert_entity(&mut self, row: EntityRow) {
        self.submit(StoreCall::InsertEntity(row));
    }

    fn update_entity(&mut self, id: &str, seq: u64, location: String) {
        self.submit(StoreCall::UpdateEntity {
            id: id.to_owned(),
            seq,
            location,
        });
    }

    fn drop_entity(&mut self, id: &str) {
        self.submit(StoreCall::DropEntity { id: id.to_owned() });
    }

    fn insert_attributes(&mut self, entity_id: &str, batch: AttributeBatch) {
        self.submit(StoreCall::InsertAttributes {
            entity_id: entity_id.to_owned(),
            batch,
        });
    }

    fn update_attributes(&mut self, entity_id: &str, batch: AttributeBatch) {
        self.submit(StoreCall::UpdateAttributes {
            entity_id: entity_id.to_owned(),
            batch,
        });
    }

    fn pending_queries(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn row(id: &str) -> EntityRow {
        EntityRow {
            id: id.to_owned(),
            container_id: None,
            type_name: "rock".to_owned(),
            seq: 0,
            location: "{}".to_owned(),
        }
    }

    #[test]
    fn test_flush_applies_everything() {
        let mut store = ThreadedStore::spawn(MemoryBackend::new(), ThreadedStoreConfig::default());
        for i in 0..50 {
            store.insert_entity(row(&i.to_string()));
        }
        store.flush().unwrap();

        assert_eq!(store.pending_queries(), 0);
        assert_eq!(store.stats().applied, 50);

        let backend = store.shutdown().unwrap();
        assert_eq!(backend.entity_count(), 50);
    }

    #[test]
    fn test_failures_counted_not_fatal() {
        let mut store = ThreadedStore::spawn(MemoryBackend::new(), ThreadedStoreConfig::default());
        store.drop_entity("missing");
        store.insert_entity(row("1"));
        store.insert_entity(row("1"));
        store.flush().unwrap();

        let stats = store.stats();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.rejected, 0);
    }

    #[test]
    fn test_backlog_visible_while_writer_is_slow() {
        let config = ThreadedStoreConfig { write_delay_us: 2_000 };
        let mut store = ThreadedStore::spawn(MemoryBackend::new(), config);
        for i in 0..20 {
            store.insert_entity(row(&i.to_string()));
        }
        // 20 calls at 2ms each cannot all be done yet.
        assert!(store.pending_queries() > 0);

        store.flush().unwrap();
        assert_eq!(store.pending_queries(), 0);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let mut store = ThreadedStore::spawn(MemoryBackend::new(), ThreadedStoreConfig::default());
        store.insert_entity(row("a"));
        store.insert_entity(row("b"));
        let backend = store.shutdown().unwrap();
        assert_eq!(backend.entity_count(), 2);
    }
}
