//! # Star Log - Chain Storage (Subsystem 02)
//!
//! **Bounded Context:** Ledger Persistence & Fork Tracking
//!
//! ## Purpose
//!
//! The authoritative local store for blocks, peers, adopted rules and
//! accounts, and the fork-aware queries the miner, validator and
//! synchronizer build on.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Idempotent Caching | A hash is stored at most once |
//! | 2 | Known Parent | Non-genesis blocks require a stored parent |
//! | 3 | Linear Chains | Heights are unique and contiguous within one chain id |
//! | 4 | Fork Roots | A new chain's `root_id` is its first block's parent |
//! | 5 | Unique Keys | Peer urls and account names are unique |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors and lineage bookkeeping
//! - `ports/` - The typed persistence collaborator (`Repository<T>`)
//! - `adapters/` - In-memory and JSON snapshot stores
//! - `service.rs` - [`ChainStorageService`]
//!
//! ## Usage
//!
//! ```
//! use shared_types::{Block, Rules};
//! use sl_02_chain_storage::{ChainStorageService, InMemoryLedgerStore};
//!
//! let rules = Rules::for_testing();
//! let mut storage = ChainStorageService::new(InMemoryLedgerStore::new());
//!
//! let genesis = Block::candidate(&rules.empty_target, 0, 0, rules.difficulty_start, 0, "", vec![]).sealed(0);
//! let stored = storage.cache_block(genesis, &rules).unwrap();
//! assert_eq!(stored.block().chain, Some(0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileBackedLedgerStore, InMemoryLedgerStore};
pub use config::StorageConfig;
pub use domain::{CacheOutcome, Lineage, Result, StorageError};
pub use ports::{LedgerStore, Repository, RulesStore, StoredEntity};
pub use service::{short_hash, ChainStorageService, SharedChainStorage};
