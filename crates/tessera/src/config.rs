//! # Server Configuration
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! tick_rate = 20
//! max_ticks = 600
//! seed = 7
//! initial_entities = 500
//! mutations_per_tick = 40
//!
//! [storage]
//! enabled = true
//! max_pending_queries = 200
//!
//! [store]
//! write_delay_us = 50
//! ```

use std::path::Path;

use serde::Deserialize;
use tessera_storage::{StorageConfig, ThreadedStoreConfig};

use crate::error::{ServerError, ServerResult};

/// Server configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// Stop after this many ticks, run forever if absent.
    pub max_ticks: Option<u64>,
    /// Simulation seed.
    pub seed: u64,
    /// Entities spawned before the first tick.
    pub initial_entities: usize,
    /// Random world changes per tick.
    pub mutations_per_tick: usize,
    /// Write-back layer settings.
    pub storage: StorageConfig,
    /// Backing store settings.
    pub store: ThreadedStoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            max_ticks: None,
            seed: 0,
            initial_entities: 100,
            mutations_per_tick: 20,
            storage: StorageConfig::default(),
            store: ThreadedStoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] on malformed TOML, unknown keys or a
    /// zero tick rate.
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the file cannot be read, otherwise as
    /// [`ServerConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ServerError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> ServerResult<()> {
        if self.tick_rate == 0 {
            return Err(ServerError::Config("tick_rate must be positive".to_string()));
        }
        Ok(())
    }
}
