//! Error types for the probe miner

use shared_types::ModelError;
use sl_01_difficulty::DifficultyError;
use sl_02_chain_storage::StorageError;
use thiserror::Error;

/// Result type alias for mining operations
pub type Result<T> = std::result::Result<T, MiningError>;

/// Errors that can occur while probing for a block
#[derive(Debug, Error)]
pub enum MiningError {
    /// No account is selected to receive the reward
    #[error("No active account, create one with `account -c <name>`")]
    NoActiveAccount,

    /// The requested parent does not exist locally
    #[error("Parent not found: {selector}")]
    ParentNotFound {
        /// Human readable description of the selection
        selector: String,
    },

    /// A hash fragment matched more than one block
    #[error("Hash fragment {fragment} matches {matches} blocks")]
    AmbiguousParent {
        /// Fragment given by the user
        fragment: String,
        /// Number of matching blocks
        matches: usize,
    },

    /// Configured meta text does not fit in a block
    #[error("Meta is {length} bytes, limit is {max}")]
    MetaTooLong {
        /// Actual byte length
        length: usize,
        /// Allowed byte length
        max: usize,
    },

    /// The nonce search exceeded its deadline
    #[error("Probe timed out after {elapsed_secs}s and {attempts} hashes")]
    Timeout {
        /// Seconds spent searching
        elapsed_secs: u64,
        /// Hashes tried
        attempts: u64,
    },

    /// The nonce search was cancelled
    #[error("Probe cancelled after {attempts} hashes")]
    Cancelled {
        /// Hashes tried
        attempts: u64,
    },

    /// The blocking search task died
    #[error("Probe aborted: {reason}")]
    Aborted {
        /// Join failure
        reason: String,
    },

    /// Chain storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Building or signing the reward event failed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The difficulty could not be unpacked
    #[error("Difficulty error: {0}")]
    Difficulty(#[from] DifficultyError),
}

impl MiningError {
    /// Whether syncing and probing again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MiningError::Timeout { .. })
    }
}
