//! # Star Log - Block Production (Subsystem 04)
//!
//! The probe miner. A probe assembles a candidate on a chosen parent,
//! searches nonces until the header hash meets the unpacked difficulty,
//! then hands the sealed block to chain storage and broadcasts it.
//!
//! ## Probe State Machine
//!
//! ```text
//! AssembleCandidate ──► SearchNonce ──► Found ──► Cache ──► Broadcast
//!                            │
//!                            └──► Timeout / Cancelled ──► Abort
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Single reward**: every candidate carries exactly one signed reward
//!    event worth `probe_reward`
//! 2. **Check boundary**: timeout and cancellation are only observed every
//!    `check_interval` hashes
//! 3. **Nonce wrap**: at `maximum_nonce` the block is re-timestamped and the
//!    nonce restarts at zero
//! 4. **Off the runtime**: the search runs on `spawn_blocking`; no lock is
//!    held while it runs
//!
//! ## Module Structure
//!
//! - [`domain`]: candidate assembly and nonce search (pure)
//! - [`ports`]: the broadcast port
//! - [`service`]: probe orchestration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::MinerConfig;
pub use domain::{
    assemble_candidate, reward_event, search_nonce, MinedBlock, ParentSelector, SearchLimits,
};
pub use error::{MiningError, Result};
pub use ports::{BlockBroadcaster, MockBroadcaster};
pub use service::{PreparedProbe, ProbeReport, ProbeService};
