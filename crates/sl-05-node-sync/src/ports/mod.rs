//! Ports for node synchronization

pub mod outbound;

pub use outbound::*;
