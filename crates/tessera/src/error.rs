//! # Server Error Types

use tessera_storage::StorageError;
use tessera_world::WorldError;
use thiserror::Error;

/// Errors that can stop the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A file could not be read.
    #[error("failed to read {path}: {reason}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O message.
        reason: String,
    },

    /// Storage layer failure.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// World graph failure.
    #[error("world: {0}")]
    World(#[from] WorldError),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
