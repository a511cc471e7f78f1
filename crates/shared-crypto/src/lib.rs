//! # Shared Crypto - Ledger Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 (hex) | Block, event and output commitments |
//! | `signatures` | RSA-PSS / SHA-256 | Fleet ownership of events |
//!
//! ## Security Properties
//!
//! - **SHA-256**: every commitment is the lowercase hex digest of a canonical string
//! - **RSA-PSS**: MGF1/SHA-256 with the maximum salt length for the key size
//! - Fleet identity is `SHA-256(public key)`, so a fleet hash never needs a registry

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{is_sha256_hex, sha256_hex};
pub use signatures::{expand_public_key, shrink_public_pem, verify_signature, FleetKeyPair};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
