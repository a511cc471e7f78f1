//! # Star Log Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Shared keys, ledgers and a block mining helper
//! │
//! └── integration/      # Cross-subsystem scenarios
//!     ├── genesis.rs    # Mining and validating a genesis block
//!     ├── forks.rs      # Competing blocks and chain ids
//!     ├── difficulty.rs # Recalculation along a lineage
//!     ├── peers.rs      # Rules reconciliation and paginated fetch
//!     └── flows.rs      # Two nodes driven through the CLI handlers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sl-tests
//!
//! # By scenario
//! cargo test -p sl-tests integration::forks
//!
//! # Benchmarks
//! cargo bench -p sl-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
