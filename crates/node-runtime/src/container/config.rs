//! # Node Configuration
//!
//! Unified configuration for the ledger subsystems.
//!
//! Values start from each subsystem's `Default`, then environment variables
//! override them, then command line flags override those.
//!
//! | Variable | Field |
//! |---|---|
//! | `SL_DATA_DIR` | `storage.data_dir` |
//! | `SL_PROBE_TIMEOUT_SECS` | `miner.probe_timeout_secs` |
//! | `SL_CHECK_INTERVAL` | `miner.check_interval` |
//! | `SL_META` | `miner.meta` |
//! | `SL_REQUEST_TIMEOUT_SECS` | `sync.request_timeout_secs` |
//! | `SL_MAX_PARALLEL_PEERS` | `sync.max_parallel_peers` |

use shared_crypto::signatures::DEFAULT_KEY_BITS;
use sl_02_chain_storage::StorageConfig;
use sl_04_block_production::MinerConfig;
use sl_05_node_sync::SyncConfig;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Ledger snapshot location.
    pub storage: StorageConfig,
    /// Probe (mining) configuration.
    pub miner: MinerConfig,
    /// Peer synchronization configuration.
    pub sync: SyncConfig,
    /// Modulus size for new account keypairs.
    pub key_bits: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            miner: MinerConfig::default(),
            sync: SyncConfig::default(),
            key_bits: DEFAULT_KEY_BITS,
        }
    }
}

impl NodeConfig {
    /// Create a config for testing: short timeouts, small keys.
    pub fn for_testing() -> Self {
        Self {
            storage: StorageConfig::for_testing(),
            miner: MinerConfig::for_testing(),
            sync: SyncConfig::for_testing(),
            key_bits: 1024,
        }
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `SL_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("SL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(meta) = lookup("SL_META") {
            self.miner.meta = meta;
        }

        override_parsed(&lookup, "SL_PROBE_TIMEOUT_SECS", &mut self.miner.probe_timeout_secs);
        override_parsed(&lookup, "SL_CHECK_INTERVAL", &mut self.miner.check_interval);
        override_parsed(&lookup, "SL_REQUEST_TIMEOUT_SECS", &mut self.sync.request_timeout_secs);
        override_parsed(&lookup, "SL_MAX_PARALLEL_PEERS", &mut self.sync.max_parallel_peers);
    }

    /// Point storage at another data directory.
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.storage.data_dir = dir;
        }
        self
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.parse() {
            Ok(value) => *field = value,
            Err(_) => warn!("{} must be a number, ignoring {:?}", key, raw),
        }
    }
}
