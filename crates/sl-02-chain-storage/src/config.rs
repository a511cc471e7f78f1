//! # Chain Storage Configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the ledger snapshot lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the snapshot.
    pub data_dir: PathBuf,

    /// Snapshot file name inside `data_dir`.
    pub snapshot_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            snapshot_file: "starlog.json".to_string(),
        }
    }
}

impl StorageConfig {
    /// Create a config for testing, under the system temp directory.
    pub fn for_testing() -> Self {
        Self {
            data_dir: std::env::temp_dir().join("starlog-test"),
            ..Self::default()
        }
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }
}
