//! Configuration for the probe miner

use serde::{Deserialize, Serialize};

/// Default probe deadline in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 180;

/// Default number of hashes between timeout checks.
pub const DEFAULT_CHECK_INTERVAL: u64 = 10_000_000;

/// Runtime configuration for the miner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Seconds the nonce search may run before giving up
    pub probe_timeout_secs: u64,

    /// Hashes between timeout, cancellation and hash-rate checks
    pub check_interval: u64,

    /// Free text stored in every mined block (at most 255 bytes)
    pub meta: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            check_interval: DEFAULT_CHECK_INTERVAL,
            meta: String::new(),
        }
    }
}

impl MinerConfig {
    /// Short intervals so cancellation and timeouts trigger quickly.
    pub fn for_testing() -> Self {
        Self {
            probe_timeout_secs: 30,
            check_interval: 1_000,
            meta: "test probe".to_string(),
        }
    }

    /// The check interval, never zero.
    pub fn effective_check_interval(&self) -> u64 {
        self.check_interval.max(1)
    }
}
