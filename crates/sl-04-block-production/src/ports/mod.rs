//! Ports for the probe miner

pub mod outbound;

pub use outbound::*;
