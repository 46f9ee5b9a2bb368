//! # World Simulation
//!
//! Seeded random activity over a live world, with the storage manager
//! subscribed as its lifecycle observer. One [`Simulation::step`] applies a
//! batch of world changes, then runs the storage tick.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_core::{EntityHandle, Quaternion, Vector3};
use tessera_storage::{BackingStore, Gauges, StorageManager, TickReport};
use tessera_world::{EntityDescriptor, World};

use crate::config::ServerConfig;
use crate::error::ServerResult;

const ENTITY_TYPES: [&str; 4] = ["npc", "chest", "tree", "door"];
const MOODS: [&str; 3] = ["calm", "curious", "hostile"];
const WORLD_EXTENT: f64 = 512.0;

/// Storage manager shared between the world (as observer) and the tick.
pub type SharedStorage<S> = Arc<Mutex<StorageManager<S, Gauges>>>;

/// A world plus its write-back layer, driven by a seeded RNG.
pub struct Simulation<S: BackingStore + 'static> {
    world: World,
    storage: SharedStorage<S>,
    rng: ChaCha8Rng,
    live: Vec<EntityHandle>,
    next_id: u64,
    mutations_per_tick: usize,
}

impl<S: BackingStore + 'static> Simulation<S> {
    /// Builds the world, wires storage to it and spawns the initial entities.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial population cannot be spawned.
    pub fn new(config: &ServerConfig, store: S) -> ServerResult<Self> {
        let storage = Arc::new(Mutex::new(StorageManager::new(
            config.storage.clone(),
            store,
            Gauges::new(),
        )));
        let mut world = World::new();
        world.add_observer(Box::new(Arc::clone(&storage)));
        storage.lock().init_world(world.root_mut()?);

        let mut sim = Self {
            world,
            storage,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            live: Vec::new(),
            next_id: 1,
            mutations_per_tick: config.mutations_per_tick,
        };
        for _ in 0..config.initial_entities {
            sim.spawn_random()?;
        }
        tracing::info!(
            "World seeded with {} entities (seed {})",
            sim.live.len(),
            config.seed
        );
        Ok(sim)
    }

    /// Applies one tick of world activity, then writes back.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects a change.
    pub fn step(&mut self) -> ServerResult<TickReport> {
        for _ in 0..self.mutations_per_tick {
            self.mutate_random()?;
        }
        Ok(self.storage.lock().tick(&mut self.world))
    }

    fn spawn_random(&mut self) -> ServerResult<EntityHandle> {
        let id = self.next_id.to_string();
        self.next_id += 1;
        let type_name = ENTITY_TYPES[self.rng.gen_range(0..ENTITY_TYPES.len())];
        let mut desc = EntityDescriptor::new(id, type_name)
            .at(self.random_position())
            .with_attribute("hp", self.rng.gen_range(1..=100_i64))
            .with_ephemeral_attribute("last_seen_tick", 0_i64);
        if self.rng.gen_bool(0.5) {
            desc = desc.facing(Quaternion::from_yaw(self.rng.gen_range(0.0..std::f64::consts::TAU)));
        }
        if self.rng.gen_bool(0.05) {
            desc = desc.ephemeral();
        }
        let handle = self.world.spawn(desc)?;
        self.live.push(handle);
        Ok(handle)
    }

    fn mutate_random(&mut self) -> ServerResult<()> {
        let roll = self.rng.gen_range(0..100);
        if roll < 8 || self.live.is_empty() {
            self.spawn_random()?;
            return Ok(());
        }

        let slot = self.rng.gen_range(0..self.live.len());
        let handle = self.live[slot];
        match roll {
            8..=13 => {
                self.live.swap_remove(slot);
                self.world.destroy(handle)?;
            }
            14..=43 => {
                let position = self.random_position();
                self.world.move_entity(handle, position)?;
            }
            44..=53 => {
                let yaw = self.rng.gen_range(0.0..std::f64::consts::TAU);
                self.world.rotate_entity(handle, Quaternion::from_yaw(yaw))?;
            }
            54..=79 => {
                let hp = self.rng.gen_range(0..=100_i64);
                self.world.set_attribute(handle, "hp", hp)?;
            }
            80..=91 => {
                let gold = self.rng.gen_range(0..10_000_i64);
                self.world.set_attribute(handle, "gold", gold)?;
            }
            _ => {
                let mood = MOODS[self.rng.gen_range(0..MOODS.len())];
                self.world.set_attribute(handle, "mood", mood)?;
            }
        }
        Ok(())
    }

    fn random_position(&mut self) -> Vector3 {
        Vector3::new(
            self.rng.gen_range(-WORLD_EXTENT..WORLD_EXTENT),
            0.0,
            self.rng.gen_range(-WORLD_EXTENT..WORLD_EXTENT),
        )
    }

    /// The live world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The storage manager.
    pub fn storage(&self) -> &SharedStorage<S> {
        &self.storage
    }

    /// Entities spawned by the simulation and still alive.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Tears the world down and hands back the store.
    ///
    /// Returns `None` if the storage manager is still shared elsewhere.
    pub fn into_store(self) -> Option<S> {
        let Self { world, storage, .. } = self;
        drop(world);
        Arc::try_unwrap(storage)
            .ok()
            .map(|manager| manager.into_inner().into_store())
    }
}
