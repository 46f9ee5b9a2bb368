//! # Throughput Accounting
//!
//! Cumulative insert/update counters plus one rolling window per op type.
//!
//! Each tick records `queries_this_tick = cumulative_after - cumulative_before`
//! into a 32-slot ring. The window sum is maintained incrementally: the slot
//! being overwritten is subtracted, the new value added. Never re-summed.

/// Number of ticks in the rolling window.
pub const QPS_WINDOW: usize = 32;

/// Fixed-size circular buffer of per-tick query counts.
#[derive(Clone, Debug)]
pub struct QpsRing {
    slots: [u64; QPS_WINDOW],
    index: usize,
    window_sum: u64,
    now: u64,
}

impl QpsRing {
    /// Creates a zeroed ring.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [0; QPS_WINDOW],
            index: 0,
            window_sum: 0,
            now: 0,
        }
    }

    /// Records one tick's query count, evicting the oldest slot.
    pub fn record(&mut self, queries: u64) {
        self.index += 1;
        if self.index >= QPS_WINDOW {
            self.index = 0;
        }
        self.window_sum -= self.slots[self.index];
        self.window_sum += queries;
        self.slots[self.index] = queries;
        self.now = queries;
    }

    /// Queries issued in the most recent tick.
    #[inline]
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Sum over the window.
    #[inline]
    #[must_use]
    pub const fn window_sum(&self) -> u64 {
        self.window_sum
    }

    /// Windowed average, `window_sum / 32` (integer division).
    #[inline]
    #[must_use]
    pub const fn average(&self) -> u64 {
        self.window_sum / QPS_WINDOW as u64
    }
}

impl Default for QpsRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of every throughput figure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThroughputSnapshot {
    /// Entity rows inserted since start.
    pub entity_inserts: u64,
    /// Entity rows updated since start.
    pub entity_updates: u64,
    /// Attribute rows inserted since start.
    pub attribute_inserts: u64,
    /// Attribute rows updated since start.
    pub attribute_updates: u64,
    /// Insert queries in the last tick.
    pub insert_qps_now: u64,
    /// Update queries in the last tick.
    pub update_qps_now: u64,
    /// Insert queries averaged over the window.
    pub insert_qps_avg: u64,
    /// Update queries averaged over the window.
    pub update_qps_avg: u64,
}

/// Counters and rings owned by the storage manager.
#[derive(Clone, Debug, Default)]
pub struct Throughput {
    pub(crate) entity_inserts: u64,
    pub(crate) entity_updates: u64,
    pub(crate) attribute_inserts: u64,
    pub(crate) attribute_updates: u64,
    inserts: QpsRing,
    updates: QpsRing,
}

impl Throughput {
    /// Creates zeroed accounting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative insert queries (entity + attribute rows).
    #[inline]
    #[must_use]
    pub const fn insert_queries(&self) -> u64 {
        self.entity_inserts + self.attribute_inserts
    }

    /// Cumulative update queries (entity + attribute rows).
    #[inline]
    #[must_use]
    pub const fn update_queries(&self) -> u64 {
        self.entity_updates + self.attribute_updates
    }

    /// Closes a tick given the cumulative counts captured at its start.
    /// Returns `(insert_queries, update_queries)` issued during the tick.
    pub fn close_tick(&mut self, inserts_before: u64, updates_before: u64) -> (u64, u64) {
        let insert_queries = self.insert_queries() - inserts_before;
        let update_queries = self.update_queries() - updates_before;
        self.inserts.record(insert_queries);
        self.updates.record(update_queries);
        (insert_queries, update_queries)
    }

    /// Copies every figure out.
    #[must_use]
    pub const fn snapshot(&self) -> ThroughputSnapshot {
        ThroughputSnapshot {
            entity_inserts: self.entity_inserts,
            entity_updates: self.entity_updates,
            attribute_inserts: self.attribute_inserts,
            attribute_updates: self.attribute_updates,
            insert_qps_now: self.inserts.now(),
            update_qps_now: self.updates.now(),
            insert_qps_avg: self.inserts.average(),
            update_qps_avg: self.updates.average(),
        }
    }
}
