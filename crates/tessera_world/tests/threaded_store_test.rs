//! Integration test: world → storage manager → writer thread → memory tables.

use std::sync::Arc;

use parking_lot::Mutex;
use tessera_core::Vector3;
use tessera_storage::{
    EntityRow, Gauges, MemoryBackend, StorageConfig, StorageManager, ThreadedStore,
    ThreadedStoreConfig,
};
use tessera_world::{EntityDescriptor, World, ROOT_ID, ROOT_TYPE};

type Manager = StorageManager<ThreadedStore<MemoryBackend>>;

fn root_row() -> EntityRow {
    EntityRow {
        id: ROOT_ID.to_owned(),
        container_id: None,
        type_name: ROOT_TYPE.to_owned(),
        seq: 0,
        location: r#"{"pos":[0.0,0.0,0.0]}"#.to_owned(),
    }
}

fn setup() -> (World, Arc<Mutex<Manager>>) {
    let store = ThreadedStore::spawn(
        MemoryBackend::seeded([root_row()]),
        ThreadedStoreConfig::default(),
    );
    let manager = Arc::new(Mutex::new(StorageManager::new(
        StorageConfig::production(),
        store,
        Gauges::new(),
    )));
    let mut world = World::new();
    world.add_observer(Box::new(Arc::clone(&manager)));
    manager.lock().init_world(world.root_mut().unwrap());
    (world, manager)
}

fn finish(world: World, manager: Arc<Mutex<Manager>>) -> (MemoryBackend, tessera_storage::StoreStats) {
    drop(world);
    let manager = Arc::try_unwrap(manager)
        .unwrap_or_else(|_| panic!("manager still shared"))
        .into_inner();
    let store = manager.into_store();
    store.flush().unwrap();
    let stats = store.stats();
    (store.shutdown().unwrap(), stats)
}

#[test]
fn test_world_round_trip_through_writer_thread() {
    let (mut world, manager) = setup();

    let handles: Vec<_> = (0..10_u32)
        .map(|i| {
            world
                .spawn(
                    EntityDescriptor::new(format!("e{i}"), "npc")
                        .at(Vector3::new(f64::from(i), 0.0, 0.0))
                        .with_attribute("hp", 100),
                )
                .unwrap()
        })
        .collect();
    let report = manager.lock().tick(&mut world);
    assert_eq!(report.inserted, 10);
    assert_eq!(report.insert_queries, 20);

    for &h in &handles[..5] {
        world.set_attribute(h, "hp", 50).unwrap();
        world.set_attribute(h, "level", 2).unwrap();
    }
    world.move_entity(handles[9], Vector3::new(0.0, 9.0, 0.0)).unwrap();
    world.set_attribute(world.root(), "era", 3).unwrap();
    let report = manager.lock().tick(&mut world);
    assert_eq!(report.updated, 7);

    for &h in &handles[7..] {
        world.destroy(h).unwrap();
    }
    let report = manager.lock().tick(&mut world);
    assert_eq!(report.deleted, 3);

    let (backend, stats) = finish(world, manager);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.rejected, 0);

    assert_eq!(backend.entity_count(), 1 + 7);
    assert_eq!(backend.attribute("e0", "hp"), Some(r#"{"val":50}"#));
    assert_eq!(backend.attribute("e0", "level"), Some(r#"{"val":2}"#));
    assert_eq!(backend.attribute("e6", "hp"), Some(r#"{"val":100}"#));
    assert_eq!(backend.attribute("e6", "level"), None);
    assert_eq!(backend.attribute(ROOT_ID, "era"), Some(r#"{"val":3}"#));
    assert!(backend.entity("e9").is_none());
    assert_eq!(backend.entity("e0").unwrap().seq, 2);
    assert_eq!(backend.entity("e0").unwrap().container_id.as_deref(), Some(ROOT_ID));
}

#[test]
fn test_slow_store_applies_backpressure() {
    let store = ThreadedStore::spawn(
        MemoryBackend::seeded([root_row()]),
        ThreadedStoreConfig { write_delay_us: 5_000 },
    );
    let config = StorageConfig {
        max_pending_queries: 4,
        ..StorageConfig::production()
    };
    let manager = Arc::new(Mutex::new(StorageManager::new(config, store, Gauges::new())));
    let mut world = World::new();
    world.add_observer(Box::new(Arc::clone(&manager)));

    let handles: Vec<_> = (0..20)
        .map(|i| world.spawn(EntityDescriptor::new(format!("s{i}"), "rock")).unwrap())
        .collect();
    // Inserts are never throttled, so the backlog now holds 20 slow calls.
    let report = manager.lock().tick(&mut world);
    assert_eq!(report.inserted, 20);

    for &h in &handles {
        world.move_entity(h, Vector3::new(1.0, 1.0, 1.0)).unwrap();
    }
    let report = manager.lock().tick(&mut world);
    assert!(report.throttled);
    assert!(report.deferred > 0);

    // Once the writer catches up everything drains.
    manager.lock().store().flush().unwrap();
    let mut updated = report.updated;
    while manager.lock().pending_updates() > 0 {
        manager.lock().store().flush().unwrap();
        updated += manager.lock().tick(&mut world).updated;
    }
    assert_eq!(updated, 20);

    let (backend, stats) = finish(world, manager);
    assert_eq!(stats.failed, 0);
    assert_eq!(backend.entity_count(), 21);
    assert_eq!(backend.entity("s3").unwrap().seq, 1);
}
