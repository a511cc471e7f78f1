//! Domain layer for block production
//!
//! Candidate assembly and the nonce search are pure; storage access,
//! the blocking task and broadcasting live in the service.

mod candidate;
mod nonce_search;

pub use candidate::*;
pub use nonce_search::*;
