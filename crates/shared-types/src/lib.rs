//! # Shared Types Crate
//!
//! This crate contains the star log ledger entities, consensus rules and the
//! peer and account records used across subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: canonical concatenation and hashing of every
//!   ledger entity is defined once, here.
//! - **Index Ordering**: inputs, outputs, modules and events are hashed in
//!   `index` order, never in storage order.
//! - **Explicit Rules**: consensus parameters travel as a [`Rules`] value;
//!   there are no process-wide constants besides [`EMPTY_TARGET`].

pub mod accounts;
pub mod entities;
pub mod errors;
pub mod peers;
pub mod rules;
pub mod spend;
pub mod time;

pub use accounts::Account;
pub use entities::*;
pub use errors::ModelError;
pub use peers::Node;
pub use rules::{NodeLimits, Rules, RulesEnvelope};
pub use spend::SpendIndex;
pub use time::{FixedTimeSource, SystemTimeSource, TimeSource, Timestamp};
