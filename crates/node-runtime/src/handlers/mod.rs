//! # Command Handlers
//!
//! Thin rendering layer between the CLI and the subsystems. Handlers return
//! the text to print; consensus decisions stay in the subsystem crates.

pub mod admin;
pub mod ledger;

use anyhow::Result;
use sl_02_chain_storage::LedgerStore;
use sl_05_node_sync::PeerClient;

use crate::cli::Command;
use crate::container::NodeContainer;

/// Run one command against the container.
pub async fn execute<S, C>(container: &NodeContainer<S, C>, command: Command) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    match command {
        Command::Probe(args) => ledger::probe(container, &args).await,
        Command::Sync => ledger::sync(container).await,
        Command::Blocks(args) => ledger::blocks(container, &args),
        Command::Fleets(args) => ledger::fleets(container, &args),
        Command::Nodes(args) => admin::nodes(container, &args).await,
        Command::Rules(args) => admin::rules(container, &args),
        Command::Account(args) => admin::account(container, &args).await,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use shared_crypto::FleetKeyPair;
    use shared_types::{Account, FixedTimeSource, Rules};
    use sl_02_chain_storage::InMemoryLedgerStore;
    use sl_05_node_sync::MockPeerNetwork;
    use std::sync::{Arc, OnceLock};

    use crate::container::{NodeConfig, NodeContainer};

    pub const NOW: u64 = 1_700_000_000;

    pub type TestContainer = NodeContainer<InMemoryLedgerStore, MockPeerNetwork>;

    pub fn keypair() -> &'static FleetKeyPair {
        static KEY: OnceLock<FleetKeyPair> = OnceLock::new();
        KEY.get_or_init(|| FleetKeyPair::generate(1024).unwrap())
    }

    /// Container with easy rules and no accounts.
    pub fn bare_container(network: MockPeerNetwork) -> TestContainer {
        let container = NodeContainer::assemble(
            NodeConfig::for_testing(),
            InMemoryLedgerStore::new(),
            Arc::new(network),
            Arc::new(FixedTimeSource::new(NOW)),
        );
        container
            .storage
            .write()
            .write_rules(Rules::for_testing())
            .unwrap();
        container
    }

    /// Container with easy rules and an active account `miner`.
    pub fn container() -> TestContainer {
        let container = bare_container(MockPeerNetwork::new());
        let account = Account::from_keypair("miner", keypair()).unwrap();
        container.storage.write().create_account(account).unwrap();
        container
    }
}
