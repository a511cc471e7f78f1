//! Configuration for node synchronization

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for peer reconciliation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Peers contacted concurrently
    pub max_parallel_peers: usize,

    /// Page size used when a peer advertises a zero block limit
    pub fallback_page_size: u32,

    /// Stop paginating a peer after this many blocks in one round
    pub max_blocks_per_peer: usize,

    /// Seconds a block time may run ahead of the local clock
    pub max_future_drift_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            max_parallel_peers: 8,
            fallback_page_size: 10,
            max_blocks_per_peer: 100_000,
            max_future_drift_secs: 0,
        }
    }
}

impl SyncConfig {
    /// Small pages and low parallelism, so pagination paths are exercised.
    pub fn for_testing() -> Self {
        Self {
            request_timeout_secs: 1,
            connect_timeout_secs: 1,
            max_parallel_peers: 2,
            fallback_page_size: 2,
            max_blocks_per_peer: 1_000,
            max_future_drift_secs: 0,
        }
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Worker pool width, never zero
    pub fn parallelism(&self) -> usize {
        self.max_parallel_peers.max(1)
    }
}
