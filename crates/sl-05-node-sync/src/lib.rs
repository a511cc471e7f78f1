//! # Star Log - Node Synchronization (Subsystem 05)
//!
//! Reconciles the local chain with known peers over their HTTP interface.
//!
//! ## Per-Peer State Machine
//!
//! ```text
//! FetchRules ─┬─ no local rules ──► AdoptRules ──┐
//!             └─ local rules ─────► CompareRules ┴─► Match: MarkActive ─► FetchBlocksPaginated ─► Merge
//!                                                └─► Mismatch: Blacklist
//! ```
//!
//! - Network or parse failures skip the peer for the round; only a rules
//!   mismatch blacklists it.
//! - Pagination starts at offset zero with the peer's `blocks_limit_max`
//!   and stops at the first short page.
//! - Merge deduplicates, sorts by height and validates each block against
//!   its lineage before caching, so ancestors are cached first.
//!
//! The service also implements the miner's broadcast port by posting to
//! every non-blacklisted peer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::HttpPeerClient;
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use ports::{BlocksQuery, MockPeer, MockPeerNetwork, PeerClient, PeerRequest};
pub use service::{NodeSyncService, PeerContact, PeerStanding, SyncReport};
