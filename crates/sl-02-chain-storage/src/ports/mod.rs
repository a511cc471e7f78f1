//! Port definitions for Chain Storage.

pub mod outbound;

pub use outbound::{LedgerStore, Repository, RulesStore, StoredEntity};
