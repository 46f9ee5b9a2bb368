//! Property tests for the write-back queues.
//!
//! Random world activity (spawns, attribute writes, moves, destroys, ticks,
//! store backlog swings) must never queue an entity twice, never update a
//! row before inserting it, and never insert the same attribute row twice.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use tessera_core::{EntityHandle, Vector3};
use tessera_storage::{
    Gauges, QueueSlot, RecordingStore, StorageConfig, StorageManager, StoreCall,
};
use tessera_world::{EntityDescriptor, World};

type Manager = StorageManager<RecordingStore>;

#[derive(Clone, Debug)]
enum Op {
    Spawn,
    Set(usize, bool, i64),
    Move(usize, f64),
    Destroy(usize),
    Tick,
    Backlog(bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Spawn),
        4 => (0..16usize, any::<bool>(), -5i64..5).prop_map(|(i, b, v)| Op::Set(i, b, v)),
        2 => (0..16usize, -10.0f64..10.0).prop_map(|(i, x)| Op::Move(i, x)),
        1 => (0..16usize).prop_map(Op::Destroy),
        2 => Just(Op::Tick),
        1 => any::<bool>().prop_map(Op::Backlog),
    ]
}

fn setup() -> (World, Arc<Mutex<Manager>>) {
    let mut world = World::new();
    let manager = Arc::new(Mutex::new(StorageManager::new(
        StorageConfig::default(),
        RecordingStore::new(),
        Gauges::new(),
    )));
    world.add_observer(Box::new(Arc::clone(&manager)));
    manager.lock().init_world(world.root_mut().unwrap());
    (world, manager)
}

fn pick(handles: &[EntityHandle], i: usize) -> Option<EntityHandle> {
    if handles.is_empty() {
        None
    } else {
        Some(handles[i % handles.len()])
    }
}

fn check_queues(world: &World, manager: &Manager) -> Result<(), TestCaseError> {
    let dirty = manager.dirty_queue_handles();
    let unique: HashSet<_> = dirty.iter().copied().collect();
    prop_assert_eq!(unique.len(), dirty.len(), "entity queued dirty twice");

    let mut queued = 0;
    for entity in world.iter() {
        let state = entity.persistence();
        match state.queue_slot() {
            Some(QueueSlot::Dirty) => {
                queued += 1;
                prop_assert!(unique.contains(&entity.handle()));
            }
            Some(QueueSlot::Creation) => {
                queued += 1;
                prop_assert!(!unique.contains(&entity.handle()));
            }
            None => prop_assert!(!unique.contains(&entity.handle())),
        }
    }
    prop_assert!(queued <= manager.pending_creates() + manager.pending_updates());
    Ok(())
}

fn check_call_log(calls: &[StoreCall]) -> Result<(), TestCaseError> {
    let mut rows: HashSet<&str> = HashSet::new();
    let mut dropped: HashSet<&str> = HashSet::new();
    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    rows.insert("0");

    for call in calls {
        let id = call.entity_id();
        prop_assert!(!dropped.contains(id), "call after drop: {:?}", call);
        match call {
            StoreCall::InsertEntity(_) => {
                prop_assert!(rows.insert(id), "entity inserted twice: {}", id);
            }
            StoreCall::UpdateEntity { .. } => {
                prop_assert!(rows.contains(id), "update before insert: {}", id);
            }
            StoreCall::DropEntity { .. } => {
                prop_assert!(rows.remove(id), "drop of unknown row: {}", id);
                dropped.insert(id);
            }
            StoreCall::InsertAttributes { batch, .. } => {
                let seen = attributes.entry(id).or_default();
                for name in batch.keys() {
                    prop_assert!(seen.insert(name.as_str()), "attribute inserted twice: {}.{}", id, name);
                }
            }
            StoreCall::UpdateAttributes { batch, .. } => {
                let seen = attributes.entry(id).or_default();
                for name in batch.keys() {
                    prop_assert!(seen.contains(name.as_str()), "update before insert: {}.{}", id, name);
                }
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_write_back_invariants(ops in prop::collection::vec(op_strategy(), 1..120)) {
        let (mut world, manager) = setup();
        let mut handles = Vec::new();
        let mut next_id = 0u32;

        for op in ops {
            match op {
                Op::Spawn => {
                    let handle = world
                        .spawn(EntityDescriptor::new(format!("p{next_id}"), "thing").with_attribute("a", 0))
                        .unwrap();
                    next_id += 1;
                    handles.push(handle);
                }
                Op::Set(i, which, value) => {
                    if let Some(h) = pick(&handles, i) {
                        let name = if which { "a" } else { "b" };
                        let _ = world.set_attribute(h, name, value);
                    }
                }
                Op::Move(i, x) => {
                    if let Some(h) = pick(&handles, i) {
                        let _ = world.move_entity(h, Vector3::new(x, 0.0, 0.0));
                    }
                }
                Op::Destroy(i) => {
                    if let Some(h) = pick(&handles, i) {
                        let _ = world.destroy(h);
                    }
                }
                Op::Tick => {
                    manager.lock().tick(&mut world);
                }
                Op::Backlog(high) => {
                    manager.lock().store_mut().set_pending(if high { 500 } else { 0 });
                }
            }
            check_queues(&world, &manager.lock())?;
        }

        // Unthrottled final tick empties every queue.
        manager.lock().store_mut().set_pending(0);
        manager.lock().tick(&mut world);
        {
            let m = manager.lock();
            prop_assert_eq!(m.pending_creates(), 0);
            prop_assert_eq!(m.pending_updates(), 0);
            prop_assert_eq!(m.pending_deletes(), 0);
        }
        for entity in world.iter() {
            prop_assert!(!entity.persistence().is_queued());
            prop_assert!(entity.persistence().is_clean());
        }

        check_call_log(manager.lock().store().calls())?;
    }
}
