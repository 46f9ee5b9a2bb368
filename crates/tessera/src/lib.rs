//! # TESSERA Server
//!
//! A persistent world server: the live world graph mutates in memory every
//! tick and the write-back layer streams the changes to a backing store
//! without ever blocking the tick on it.
//!
//! ```text
//! TickLoop ─► Simulation::step ─► World (mutations, notifications)
//!                    │
//!                    └──────────► StorageManager::tick ─► ThreadedStore ─► writer thread
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod simulation;
pub mod tick;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use simulation::{SharedStorage, Simulation};
pub use tick::{TickLoop, TickStats, DEFAULT_TICK_RATE};
