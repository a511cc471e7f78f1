//! # Peer Reconciliation
//!
//! Rounds of synchronization against simulated peers serving blocks mined
//! by a real miner on a separate ledger.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{Block, FixedTimeSource, NodeLimits, Rules, RulesEnvelope};
    use sl_02_chain_storage::{ChainStorageService, InMemoryLedgerStore, SharedChainStorage};
    use sl_04_block_production::BlockBroadcaster;
    use sl_05_node_sync::{
        BlocksQuery, MockPeer, MockPeerNetwork, NodeSyncService, PeerRequest, SyncConfig,
    };

    use crate::fixtures::{chain_of, ledger, miner_a, miner_b, mine_and_cache, NOW};

    const REMOTE: &str = "http://remote:3000";
    const OTHER: &str = "http://other:3000";

    type Sync = NodeSyncService<InMemoryLedgerStore, MockPeerNetwork>;

    fn envelope(rules: Rules, blocks_limit_max: u32) -> RulesEnvelope {
        RulesEnvelope {
            rules,
            limits: NodeLimits {
                events_limit_max: 50,
                blocks_limit_max,
            },
        }
    }

    /// Local node knowing `urls`, with `local_rules` adopted when given.
    fn local_node(
        local_rules: Option<&Rules>,
        network: MockPeerNetwork,
        urls: &[&str],
    ) -> (Sync, SharedChainStorage<InMemoryLedgerStore>, Arc<MockPeerNetwork>) {
        let mut storage = ChainStorageService::new(InMemoryLedgerStore::new());
        if let Some(rules) = local_rules {
            storage.write_rules(rules.clone()).unwrap();
        }
        for url in urls {
            storage.add_peer(url).unwrap();
        }
        let storage = storage.shared();
        let network = Arc::new(network);
        let service = NodeSyncService::new(
            Arc::clone(&storage),
            Arc::clone(&network),
            Arc::new(FixedTimeSource::new(NOW)),
            SyncConfig::for_testing(),
        );
        (service, storage, network)
    }

    fn pages(network: &MockPeerNetwork, url: &str) -> Vec<BlocksQuery> {
        network
            .requests_to(url)
            .into_iter()
            .filter_map(|request| match request {
                PeerRequest::GetBlocks { query, .. } => Some(query),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_peer_with_different_rules_is_blacklisted() {
        let rules = Rules::for_testing();
        let (_, remote_blocks) = chain_of(3, 10, &rules, miner_a());
        let remote_rules = Rules {
            jump_distance_max: rules.jump_distance_max + 1.0,
            ..rules.clone()
        };
        let network = MockPeerNetwork::new()
            .with_peer(REMOTE, MockPeer::new(envelope(remote_rules, 10), remote_blocks));
        let (service, storage, network) = local_node(Some(&rules), network, &[REMOTE]);

        let report = service.sync().await.unwrap();

        assert_eq!(report.peers_blacklisted, 1);
        assert_eq!(report.blocks_merged, 0);
        assert!(pages(&network, REMOTE).is_empty());

        let storage = storage.read();
        assert_eq!(storage.block_count().unwrap(), 0);
        let node = storage.find_peer_by_url(REMOTE).unwrap().unwrap();
        assert!(node.blacklisted);
        assert!(node.blacklist_reason.unwrap().contains("rules"));
        assert_eq!(storage.find_rules().unwrap(), Some(rules));
    }

    #[tokio::test]
    async fn test_paginated_retrieval_merges_in_height_order() {
        let rules = Rules::for_testing();
        let (_, mut remote_blocks) = chain_of(5, 10, &rules, miner_a());
        let tip = remote_blocks.last().unwrap().hash.clone();
        remote_blocks.reverse();
        let network = MockPeerNetwork::new()
            .with_peer(REMOTE, MockPeer::new(envelope(rules.clone(), 2), remote_blocks));
        let (service, storage, network) = local_node(Some(&rules), network, &[REMOTE]);

        let report = service.sync().await.unwrap();

        let requested: Vec<_> = pages(&network, REMOTE)
            .iter()
            .map(|query| (query.limit, query.offset))
            .collect();
        assert_eq!(
            requested,
            vec![(Some(2), Some(0)), (Some(2), Some(2)), (Some(2), Some(4))]
        );
        assert_eq!(report.blocks_received, 5);
        assert_eq!(report.blocks_merged, 5);
        assert_eq!(report.blocks_rejected, 0);

        let storage = storage.read();
        let heights: Vec<u64> = storage.all_blocks().unwrap().iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![0, 1, 2, 3, 4]);
        assert_eq!(storage.highest_block().unwrap().unwrap().hash, tip);
    }

    #[tokio::test]
    async fn test_fresh_node_adopts_rules_and_forks() {
        let rules = Rules::for_testing();
        let remote = ledger(&rules);
        let genesis = mine_and_cache(&remote, &rules.empty_target, &rules, miner_a(), NOW - 30);
        let left = mine_and_cache(&remote, &genesis.hash, &rules, miner_a(), NOW - 20);
        let right = mine_and_cache(&remote, &genesis.hash, &rules, miner_b(), NOW - 19);
        let served: Vec<Block> = vec![right.clone(), left.clone(), genesis];

        let network = MockPeerNetwork::new()
            .with_peer(REMOTE, MockPeer::new(envelope(rules.clone(), 10), served));
        let (service, storage, _) = local_node(None, network, &[REMOTE]);

        let report = service.sync().await.unwrap();
        assert!(report.rules_adopted);
        assert_eq!(report.blocks_merged, 3);

        let storage = storage.read();
        assert_eq!(storage.find_rules().unwrap(), Some(rules));
        let siblings = storage.blocks_at_height(1, 10).unwrap();
        assert_eq!(siblings.len(), 2);
        assert_ne!(siblings[0].chain, siblings[1].chain);
    }

    #[tokio::test]
    async fn test_adopted_empty_target_anchors_genesis() {
        let rules = Rules {
            empty_target: "1".repeat(64),
            ..Rules::for_testing()
        };
        let remote = ledger(&rules);
        let genesis = mine_and_cache(&remote, &rules.empty_target, &rules, miner_a(), NOW - 20);
        let child = mine_and_cache(&remote, &genesis.hash, &rules, miner_a(), NOW - 10);

        let network = MockPeerNetwork::new().with_peer(
            REMOTE,
            MockPeer::new(envelope(rules.clone(), 10), vec![child.clone(), genesis]),
        );
        let (service, storage, _) = local_node(None, network, &[REMOTE]);

        let report = service.sync().await.unwrap();
        assert!(report.rules_adopted);
        assert_eq!(report.blocks_merged, 2);
        assert_eq!(report.blocks_rejected, 0);

        let tip = storage.read().highest_block().unwrap().unwrap();
        assert_eq!(tip.hash, child.hash);
        assert_eq!(tip.height, 1);
    }

    #[tokio::test]
    async fn test_unreachable_peer_counts_as_failed() {
        let rules = Rules::for_testing();
        let (_, remote_blocks) = chain_of(2, 10, &rules, miner_a());
        let network = MockPeerNetwork::new()
            .with_peer(REMOTE, MockPeer::new(envelope(rules.clone(), 10), remote_blocks))
            .with_peer(OTHER, MockPeer::unreachable());
        let (service, storage, _) = local_node(Some(&rules), network, &[REMOTE, OTHER]);

        let report = service.sync().await.unwrap();

        assert_eq!(report.peers_contacted, 2);
        assert_eq!(report.peers_failed, 1);
        assert_eq!(report.peers_blacklisted, 0);
        assert_eq!(report.blocks_merged, 2);
        assert!(!storage.read().find_peer_by_url(OTHER).unwrap().unwrap().blacklisted);
    }

    #[tokio::test]
    async fn test_broadcast_skips_blacklisted_and_counts_acceptances() {
        let rules = Rules::for_testing();
        let refusing = MockPeer {
            accepts_blocks: false,
            ..MockPeer::new(envelope(rules.clone(), 10), Vec::new())
        };
        let network = MockPeerNetwork::new()
            .with_peer(REMOTE, MockPeer::new(envelope(rules.clone(), 10), Vec::new()))
            .with_peer(OTHER, refusing)
            .with_peer("http://banned:3000", MockPeer::new(envelope(rules.clone(), 10), Vec::new()));
        let (service, storage, network) =
            local_node(Some(&rules), network, &[REMOTE, OTHER, "http://banned:3000"]);

        let banned = storage
            .read()
            .find_peer_by_url("http://banned:3000")
            .unwrap()
            .unwrap();
        service.blacklist_peer(banned.id.unwrap(), "testing").unwrap();

        let block = mine_and_cache(&storage, &rules.empty_target, &rules, miner_a(), NOW);
        let accepted = service.broadcast(&block).await;

        assert_eq!(accepted, 1);
        assert_eq!(network.blocks_of(REMOTE), vec![block]);
        assert!(network.blocks_of(OTHER).is_empty());
        assert!(network.requests_to("http://banned:3000").is_empty());
    }
}
