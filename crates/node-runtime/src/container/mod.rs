//! # Subsystem Container
//!
//! Holds the ledger subsystems and wires them together:
//!
//! ```text
//! FileBackedLedgerStore ─► ChainStorageService (Arc<RwLock<_>>)
//!                              ├─► NodeSyncService ◄─ HttpPeerClient
//!                              └─► ProbeService ─► broadcast via NodeSyncService
//! ```
//!
//! Storage is shared through one lock; the sync service doubles as the
//! miner's block broadcaster.

pub mod config;

pub use config::NodeConfig;

use anyhow::{Context, Result};
use shared_types::{SystemTimeSource, TimeSource};
use sl_02_chain_storage::{
    ChainStorageService, FileBackedLedgerStore, LedgerStore, SharedChainStorage,
};
use sl_04_block_production::{BlockBroadcaster, ProbeService};
use sl_05_node_sync::{HttpPeerClient, NodeSyncService, PeerClient};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Container used by the `starlog` binary.
pub type LiveContainer = NodeContainer<FileBackedLedgerStore, HttpPeerClient>;

/// Every subsystem the CLI talks to.
pub struct NodeContainer<S: LedgerStore + 'static, C: PeerClient + 'static> {
    /// Effective configuration.
    pub config: NodeConfig,
    /// Shared chain storage.
    pub storage: SharedChainStorage<S>,
    /// Peer reconciliation and broadcast.
    pub sync: Arc<NodeSyncService<S, C>>,
    /// Block production.
    pub probe: ProbeService<S>,
}

impl<S: LedgerStore + 'static, C: PeerClient + 'static> NodeContainer<S, C> {
    /// Wire the subsystems around an already opened store and client.
    pub fn assemble(
        config: NodeConfig,
        store: S,
        client: Arc<C>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let storage = ChainStorageService::new(store).shared();
        let sync = Arc::new(NodeSyncService::new(
            Arc::clone(&storage),
            client,
            Arc::clone(&clock),
            config.sync.clone(),
        ));
        let broadcaster: Arc<dyn BlockBroadcaster> = sync.clone();
        let probe = ProbeService::new(
            Arc::clone(&storage),
            broadcaster,
            clock,
            config.miner.clone(),
        );

        Self {
            config,
            storage,
            sync,
            probe,
        }
    }
}

impl LiveContainer {
    /// Open the snapshot under the configured data directory and build an
    /// HTTP peer client.
    #[instrument(skip(config), fields(data_dir = %config.storage.data_dir.display()))]
    pub fn open(config: NodeConfig) -> Result<Self> {
        let path = config.storage.snapshot_path();
        let store = FileBackedLedgerStore::open(&path)
            .with_context(|| format!("cannot open ledger snapshot {}", path.display()))?;
        let client = HttpPeerClient::new(&config.sync).context("cannot build HTTP client")?;
        debug!("Opened ledger snapshot {}", path.display());

        Ok(Self::assemble(
            config,
            store,
            Arc::new(client),
            Arc::new(SystemTimeSource),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{FixedTimeSource, Rules};
    use sl_02_chain_storage::InMemoryLedgerStore;
    use sl_05_node_sync::MockPeerNetwork;

    #[test]
    fn test_subsystems_share_storage() {
        let container = NodeContainer::assemble(
            NodeConfig::for_testing(),
            InMemoryLedgerStore::new(),
            Arc::new(MockPeerNetwork::new()),
            Arc::new(FixedTimeSource::new(1_700_000_000)),
        );

        container
            .storage
            .write()
            .write_rules(Rules::for_testing())
            .unwrap();
        assert_eq!(container.probe.rules().unwrap(), Rules::for_testing());
        assert!(container.sync.peers().unwrap().is_empty());
    }

    #[test]
    fn test_first_write_creates_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::for_testing();
        config.storage.data_dir = dir.path().join("nested");

        let container = LiveContainer::open(config).unwrap();
        container.storage.write().add_peer("http://peer.test").unwrap();

        assert!(dir.path().join("nested").join("starlog.json").exists());
    }
}
