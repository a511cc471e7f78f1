//! # Command Flows
//!
//! Whole `starlog` commands, parsed from argv and executed against node
//! containers, the way an operator would drive two nodes.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::Parser;
    use node_runtime::handlers::execute;
    use node_runtime::{Cli, LiveContainer, NodeConfig, NodeContainer};
    use shared_types::{Block, FixedTimeSource, NodeLimits, Rules, RulesEnvelope};
    use sl_02_chain_storage::{short_hash, InMemoryLedgerStore};
    use sl_05_node_sync::{MockPeer, MockPeerNetwork};

    use crate::fixtures::{account, miner_a, NOW};

    type TestNode = NodeContainer<InMemoryLedgerStore, MockPeerNetwork>;

    const NODE_A: &str = "http://node-a:3000";

    fn node(network: MockPeerNetwork) -> TestNode {
        NodeContainer::assemble(
            NodeConfig::for_testing(),
            InMemoryLedgerStore::new(),
            Arc::new(network),
            Arc::new(FixedTimeSource::new(NOW)),
        )
    }

    async fn run<S, C>(container: &NodeContainer<S, C>, argv: &[&str]) -> anyhow::Result<String>
    where
        S: sl_02_chain_storage::LedgerStore + 'static,
        C: sl_05_node_sync::PeerClient + 'static,
    {
        let cli = Cli::try_parse_from(std::iter::once("starlog").chain(argv.iter().copied()))?;
        execute(container, cli.command).await
    }

    #[tokio::test]
    async fn test_second_node_syncs_what_first_probed() {
        let rules = Rules::for_testing();
        let node_a = node(MockPeerNetwork::new());
        {
            let mut storage = node_a.storage.write();
            storage.write_rules(rules.clone()).unwrap();
            storage.create_account(account("pilot", miner_a())).unwrap();
        }

        let first = run(&node_a, &["probe", "-g"]).await.unwrap();
        assert!(first.contains("height 0"));
        run(&node_a, &["probe"]).await.unwrap();
        run(&node_a, &["probe"]).await.unwrap();
        let mined: Vec<Block> = node_a.storage.read().all_blocks().unwrap();
        assert_eq!(mined.len(), 3);

        let envelope = RulesEnvelope {
            rules: rules.clone(),
            limits: NodeLimits {
                events_limit_max: 50,
                blocks_limit_max: 2,
            },
        };
        let node_b = node(
            MockPeerNetwork::new().with_peer(NODE_A, MockPeer::new(envelope, mined.clone())),
        );

        let added = run(&node_b, &["nodes", "-a", NODE_A]).await.unwrap();
        assert!(added.starts_with(&format!("Added [1] {NODE_A}")));
        assert_eq!(node_b.storage.read().find_rules().unwrap(), Some(rules));

        let synced = run(&node_b, &["sync"]).await.unwrap();
        assert!(synced.contains("merged 3"));

        let listed = run(&node_b, &["blocks"]).await.unwrap();
        assert_eq!(listed.lines().count(), 3);
        for block in &mined {
            assert!(listed.contains(short_hash(&block.hash)));
        }
        let at_tip = run(&node_b, &["blocks", "-h", "2"]).await.unwrap();
        assert_eq!(at_tip.lines().count(), 1);
        assert!(at_tip.contains(short_hash(&mined[2].hash)));

        // A second round has nothing new
        let again = run(&node_b, &["sync"]).await.unwrap();
        assert!(again.contains("merged 0"));
    }

    #[tokio::test]
    async fn test_probe_without_account_fails_with_context() {
        let node_a = node(MockPeerNetwork::new());
        node_a
            .storage
            .write()
            .write_rules(Rules::for_testing())
            .unwrap();

        let err = run(&node_a, &["probe", "-g"]).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("probe on genesis failed"));
        assert_eq!(node_a.storage.read().block_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::for_testing();
        config.storage.data_dir = dir.path().to_path_buf();

        let hash = {
            let node = LiveContainer::open(config.clone()).unwrap();
            node.storage
                .write()
                .write_rules(Rules::for_testing())
                .unwrap();
            let created = run(&node, &["account", "-c", "pilot"]).await.unwrap();
            assert!(created.contains("It is now the active account"));
            run(&node, &["probe", "-g"]).await.unwrap();
            let hash = node.storage.read().highest_block().unwrap().unwrap().hash;
            hash
        };

        let node = LiveContainer::open(config).unwrap();
        let listed = run(&node, &["blocks"]).await.unwrap();
        assert_eq!(listed.lines().count(), 1);
        assert!(listed.contains(short_hash(&hash)));

        let accounts = run(&node, &["account"]).await.unwrap();
        assert!(accounts.starts_with("* pilot"));

        let fleets = run(&node, &["fleets"]).await.unwrap();
        assert!(fleets.contains("Fleet "));
        assert!(fleets.contains("vessel"));

        let rules = run(&node, &["rules"]).await.unwrap();
        assert!(!rules.starts_with("No rules adopted"));
    }
}
