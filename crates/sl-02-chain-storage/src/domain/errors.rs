//! # Domain Errors
//!
//! Error types for the Chain Storage subsystem.
//!
//! Expected absence on lookups is an `Ok(None)`; `NotFound` is reserved for
//! ids and hashes the caller asserts exist.

use sl_01_difficulty::DifficultyError;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No record with this key.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Table name.
        entity: &'static str,
        /// Id, hash, url or name that was looked up.
        key: String,
    },

    /// A unique column already holds this value.
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// Table name.
        entity: &'static str,
        /// Duplicate value.
        key: String,
    },

    /// The parent of a block is not stored locally.
    #[error("Orphan block: parent {previous_hash} is unknown")]
    OrphanBlock {
        /// Missing parent hash.
        previous_hash: String,
    },

    /// Snapshot file could not be read or written.
    #[error("I/O error: {message}")]
    Io {
        /// Underlying error message.
        message: String,
    },

    /// Snapshot could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Underlying error message.
        message: String,
    },

    /// Difficulty recalculation failed.
    #[error("Difficulty error: {0}")]
    Difficulty(#[from] DifficultyError),
}

impl StorageError {
    /// Shorthand for [`StorageError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StorageError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`StorageError::Conflict`].
    pub fn conflict(entity: &'static str, key: impl ToString) -> Self {
        StorageError::Conflict {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization {
            message: e.to_string(),
        }
    }
}
