//! Error types for node synchronization

use sl_02_chain_storage::StorageError;
use sl_03_validation::ValidationError;
use thiserror::Error;

/// Result type alias for synchronization
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while talking to peers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The request never produced a usable HTTP response
    #[error("Peer {url} unreachable: {reason}")]
    PeerUnreachable {
        /// Peer base url
        url: String,
        /// Transport diagnostic
        reason: String,
    },

    /// The response body could not be decoded
    #[error("Unable to parse response from {url}: {reason}")]
    Parse {
        /// Peer base url
        url: String,
        /// Decoder diagnostic
        reason: String,
    },

    /// The peer answered with a failure status
    #[error("Peer {url} rejected the request with status {status}")]
    Rejected {
        /// Peer base url
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// No peer with this id is known
    #[error("No node with id {id}")]
    PeerNotFound {
        /// Local peer id
        id: u64,
    },

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),

    /// A received block failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Chain storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SyncError {
    /// Whether the failure only skips the peer for the current round.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::PeerUnreachable { .. } | SyncError::Parse { .. } | SyncError::Rejected { .. }
        )
    }
}
