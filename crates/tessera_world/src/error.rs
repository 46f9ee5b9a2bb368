//! # World Error Types

use tessera_core::EntityHandle;
use thiserror::Error;

/// Errors returned by world graph mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// An entity with this identifier already exists.
    #[error("duplicate entity id: {0}")]
    DuplicateId(String),

    /// The named container does not exist.
    #[error("unknown container: {0}")]
    UnknownContainer(String),

    /// The handle no longer refers to a live entity.
    #[error("stale handle: {0:?}")]
    StaleHandle(EntityHandle),

    /// The world root cannot be destroyed.
    #[error("the world root cannot be destroyed")]
    RootDestroy,

    /// Every slot index is in use.
    #[error("world is full")]
    Full,

    /// The entity still contains other entities.
    #[error("entity {0} is not empty")]
    NotEmpty(String),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
