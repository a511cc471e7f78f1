//! Validation configuration.

use serde::{Deserialize, Serialize};

/// Tunables that are local policy rather than consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Seconds a block time may run ahead of the local clock.
    pub max_future_drift_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_future_drift_secs: 0,
        }
    }
}

impl ValidationConfig {
    /// Tolerant clock, for tests that build blocks against a fixed time.
    pub fn for_testing() -> Self {
        Self {
            max_future_drift_secs: 60,
        }
    }
}
