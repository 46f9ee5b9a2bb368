//! # Storage Configuration
//!
//! Loaded once at startup from the `[storage]` table of the server's TOML
//! file. Every field has a default so an empty table is valid.

use serde::Deserialize;

use crate::error::{StorageError, StorageResult};

/// Store backlog above which the dirty queue stops draining for the tick.
pub const DEFAULT_MAX_PENDING_QUERIES: usize = 200;

/// Configuration for the write-back layer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// When false, lifecycle notifications are ignored and ticks do nothing.
    pub enabled: bool,
    /// Backpressure threshold checked before each dirty-queue entry.
    pub max_pending_queries: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_pending_queries: DEFAULT_MAX_PENDING_QUERIES,
        }
    }
}

impl StorageConfig {
    /// Production config: same threshold, persistence on.
    #[must_use]
    pub const fn production() -> Self {
        Self {
            enabled: true,
            max_pending_queries: DEFAULT_MAX_PENDING_QUERIES,
        }
    }

    /// Persistence switched off entirely.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_pending_queries: DEFAULT_MAX_PENDING_QUERIES,
        }
    }

    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the text is not valid TOML
    /// or contains unknown keys.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        toml::from_str(text).map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_pending_queries, 200);
        assert_eq!(config, StorageConfig::production());
    }

    #[test]
    fn test_from_toml() {
        let config = StorageConfig::from_toml_str("max_pending_queries = 50\n").unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_pending_queries, 50);

        let config = StorageConfig::from_toml_str("enabled = false").unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = StorageConfig::from_toml_str("max_queries = 5").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(_)));
    }
}
