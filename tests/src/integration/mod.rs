//! # Integration Scenarios
//!
//! Cross-subsystem tests. Each module exercises storage, validation, mining
//! and synchronization together the way a running node would.

pub mod difficulty;
pub mod flows;
pub mod forks;
pub mod genesis;
pub mod peers;
