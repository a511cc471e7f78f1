//! # Error Types
//!
//! Errors raised while building, hashing or signing ledger entities.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Ledger model errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required field is absent.
    #[error("Missing field: {field}")]
    MissingField {
        /// Dotted path of the field.
        field: String,
    },

    /// The signing keypair does not own the event's fleet.
    #[error("Fleet mismatch: event belongs to {expected}, key is {actual}")]
    FleetMismatch {
        /// Fleet hash on the event.
        expected: String,
        /// Fleet hash of the keypair.
        actual: String,
    },

    /// Hashing or signature failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
