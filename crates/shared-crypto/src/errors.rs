//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Private key could not be parsed or encoded
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Public key could not be parsed or encoded
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature is not valid hex
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature does not match the message and key
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
}
