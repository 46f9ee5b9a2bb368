//! # Storage Tick Benchmark
//!
//! Measures one write-back cycle over a world with a large dirty set:
//! 1. Insert drain (fresh entities, 4 attributes each)
//! 2. Update drain (every entity mutated once)
//! 3. Throttled tick (store backlog over the limit, nothing drained)

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use parking_lot::Mutex;
use tessera_core::EntityHandle;
use tessera_storage::{NullSink, RecordingStore, StorageConfig, StorageManager};
use tessera_world::{EntityDescriptor, World};

const ENTITY_COUNT: usize = 10_000;

type Manager = StorageManager<RecordingStore, NullSink>;

fn populated() -> (World, Arc<Mutex<Manager>>, Vec<EntityHandle>) {
    let mut world = World::new();
    let manager = Arc::new(Mutex::new(StorageManager::new(
        StorageConfig::production(),
        RecordingStore::new(),
        NullSink,
    )));
    world.add_observer(Box::new(Arc::clone(&manager)));

    let handles = (0..ENTITY_COUNT)
        .map(|i| {
            world
                .spawn(
                    EntityDescriptor::new(format!("b{i}"), "npc")
                        .with_attribute("hp", 100)
                        .with_attribute("mana", 50)
                        .with_attribute("name", "bench")
                        .with_attribute("level", 1),
                )
                .unwrap_or_else(|e| panic!("spawn failed: {e}"))
        })
        .collect();
    (world, manager, handles)
}

fn bench_insert_drain(c: &mut Criterion) {
    c.bench_function("storage_tick_insert_10k", |b| {
        b.iter_batched(
            populated,
            |(mut world, manager, _)| black_box(manager.lock().tick(&mut world)),
            BatchSize::LargeInput,
        );
    });
}

fn bench_update_drain(c: &mut Criterion) {
    c.bench_function("storage_tick_update_10k", |b| {
        b.iter_batched(
            || {
                let (mut world, manager, handles) = populated();
                manager.lock().tick(&mut world);
                for &h in &handles {
                    let _ = world.set_attribute(h, "hp", 99);
                }
                (world, manager)
            },
            |(mut world, manager)| black_box(manager.lock().tick(&mut world)),
            BatchSize::LargeInput,
        );
    });
}

fn bench_throttled_tick(c: &mut Criterion) {
    let (mut world, manager, handles) = populated();
    manager.lock().tick(&mut world);
    for &h in &handles {
        let _ = world.set_attribute(h, "hp", 99);
    }
    manager.lock().store_mut().set_pending(10_000);

    c.bench_function("storage_tick_throttled_10k_dirty", |b| {
        b.iter(|| black_box(manager.lock().tick(&mut world)));
    });
}

criterion_group!(benches, bench_insert_drain, bench_update_drain, bench_throttled_tick);
criterion_main!(benches);
