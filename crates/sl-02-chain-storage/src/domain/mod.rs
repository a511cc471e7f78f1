//! Domain layer: errors and lineage bookkeeping.

pub mod errors;
pub mod lineage;

pub use errors::{Result, StorageError};
pub use lineage::{CacheOutcome, Lineage};
