//! # Monitoring Gauges
//!
//! The storage manager publishes its throughput figures through an injected
//! [`MetricsSink`] at construction and after every tick. [`Gauges`] keeps
//! the latest value per name and renders them as `name value` lines.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::throughput::ThroughputSnapshot;

/// Cumulative entity rows inserted.
pub const ENTITY_INSERTS: &str = "storage_entity_inserts";
/// Cumulative entity rows updated.
pub const ENTITY_UPDATES: &str = "storage_entity_updates";
/// Cumulative attribute rows inserted (published under the `property` name).
pub const ATTRIBUTE_INSERTS: &str = "storage_property_inserts";
/// Cumulative attribute rows updated.
pub const ATTRIBUTE_UPDATES: &str = "storage_property_updates";
/// Insert queries issued in the last tick.
pub const INSERT_QPS_NOW: &str = "storage_qps{qtype=inserts,t=1}";
/// Update queries issued in the last tick.
pub const UPDATE_QPS_NOW: &str = "storage_qps{qtype=updates,t=1}";
/// Insert queries averaged over the 32-tick window.
pub const INSERT_QPS_AVG: &str = "storage_qps{qtype=inserts,t=32}";
/// Update queries averaged over the 32-tick window.
pub const UPDATE_QPS_AVG: &str = "storage_qps{qtype=updates,t=32}";

/// Destination for named numeric gauges.
pub trait MetricsSink {
    /// Sets gauge `name` to `value`.
    fn gauge(&mut self, name: &'static str, value: u64);
}

/// Writes every throughput figure to `sink`.
pub fn publish(sink: &mut (impl MetricsSink + ?Sized), snapshot: &ThroughputSnapshot) {
    sink.gauge(ENTITY_INSERTS, snapshot.entity_inserts);
    sink.gauge(ENTITY_UPDATES, snapshot.entity_updates);
    sink.gauge(ATTRIBUTE_INSERTS, snapshot.attribute_inserts);
    sink.gauge(ATTRIBUTE_UPDATES, snapshot.attribute_updates);
    sink.gauge(INSERT_QPS_NOW, snapshot.insert_qps_now);
    sink.gauge(UPDATE_QPS_NOW, snapshot.update_qps_now);
    sink.gauge(INSERT_QPS_AVG, snapshot.insert_qps_avg);
    sink.gauge(UPDATE_QPS_AVG, snapshot.update_qps_avg);
}

/// In-memory gauge table.
#[derive(Clone, Debug, Default)]
pub struct Gauges {
    values: BTreeMap<&'static str, u64>,
}

impl Gauges {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value of a gauge.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    /// Number of gauges registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing was ever published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders every gauge as a `name value` line, sorted by name.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.values {
            let _ = writeln!(out, "{name} {value}");
        }
        out
    }
}

impl MetricsSink for Gauges {
    fn gauge(&mut self, name: &'static str, value: u64) {
        self.values.insert(name, value);
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<Mutex<T>> {
    fn gauge(&mut self, name: &'static str, value: u64) {
        self.lock().gauge(name, value);
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn gauge(&mut self, _name: &'static str, _value: u64) {}
}
