//! # Storage Error Types
//!
//! Errors that can occur inside the persistence layer. None of these cross
//! the notification or tick entry points; they are logged where they occur.

use thiserror::Error;

/// Errors that can occur in the storage system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A value could not be serialized into the store's representation.
    #[error("failed to encode {what}: {reason}")]
    Encode {
        /// What was being encoded.
        what: String,
        /// Underlying serializer message.
        reason: String,
    },

    /// The store was asked to modify a row that does not exist.
    #[error("missing {table} row: {id}")]
    MissingRow {
        /// Table name.
        table: &'static str,
        /// Row key.
        id: String,
    },

    /// The store was asked to insert a row that already exists.
    #[error("duplicate {table} row: {id}")]
    DuplicateRow {
        /// Table name.
        table: &'static str,
        /// Row key.
        id: String,
    },

    /// The store's writer has shut down.
    #[error("store closed")]
    StoreClosed,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
