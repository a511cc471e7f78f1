//! # Forks and Spends
//!
//! Competing blocks on one parent open separate chains. Spends are judged
//! per lineage: an output consumed on one chain is still spendable on a
//! sibling chain, but never twice on the same one.

#[cfg(test)]
mod tests {
    use shared_crypto::FleetKeyPair;
    use shared_types::{Block, Event, Rules};
    use sl_02_chain_storage::{InMemoryLedgerStore, SharedChainStorage};
    use sl_03_validation::{BlockContext, BlockValidator, ValidationError};

    use crate::fixtures::{jump_event, ledger, miner_a, miner_b, mine_and_cache, mine_with, NOW};

    type Storage = SharedChainStorage<InMemoryLedgerStore>;

    /// Sealed, uncached block on `previous_hash`.
    fn mine_on(
        storage: &Storage,
        previous_hash: &str,
        keypair: &FleetKeyPair,
        time: u64,
        extra: Vec<Event>,
    ) -> Block {
        let rules = storage.read().find_rules().unwrap().unwrap();
        mine_with(&*storage.read(), previous_hash, &rules, keypair, time, extra)
    }

    /// Full contextual validation against what `storage` knows.
    fn check(storage: &Storage, block: &Block) -> Result<(), ValidationError> {
        let storage = storage.read();
        let rules = storage.find_rules().unwrap().unwrap();
        let parent = storage
            .find_block_by_hash(&block.previous_hash)
            .unwrap()
            .unwrap();
        let context = BlockContext::child_of(
            parent,
            storage.next_difficulty(&block.previous_hash, &rules).unwrap(),
            storage.spend_index(&block.previous_hash, &rules).unwrap(),
        );
        BlockValidator::new(rules).validate_in_context(block, &context, NOW)
    }

    #[test]
    fn test_competing_blocks_get_distinct_chains() {
        let rules = Rules::for_testing();
        let storage = ledger(&rules);
        let parent = mine_and_cache(&storage, &rules.empty_target, &rules, miner_a(), NOW - 10);

        let first = mine_on(&storage, &parent.hash, miner_a(), NOW - 5, vec![]);
        let second = mine_on(&storage, &parent.hash, miner_b(), NOW - 4, vec![]);
        assert_ne!(first.hash, second.hash);

        let first = storage.write().cache_block(first, &rules).unwrap().into_block();
        let second = storage.write().cache_block(second, &rules).unwrap().into_block();

        assert_eq!(first.height, 1);
        assert_eq!(second.height, 1);
        assert_ne!(first.chain, second.chain);
        assert_eq!(first.chain, parent.chain);
        assert_eq!(second.root_id, parent.id);
        assert_eq!(storage.read().blocks_at_height(1, 10).unwrap().len(), 2);
    }

    #[test]
    fn test_longer_fork_becomes_highest() {
        let rules = Rules::for_testing();
        let storage = ledger(&rules);
        let genesis = mine_and_cache(&storage, &rules.empty_target, &rules, miner_a(), NOW - 30);
        let main = mine_and_cache(&storage, &genesis.hash, &rules, miner_a(), NOW - 20);

        let fork = mine_and_cache(&storage, &genesis.hash, &rules, miner_b(), NOW - 19);
        assert_eq!(storage.read().highest_block().unwrap().unwrap().hash, main.hash);

        let fork_tip = mine_and_cache(&storage, &fork.hash, &rules, miner_b(), NOW - 10);
        assert_eq!(fork_tip.chain, fork.chain);
        assert_eq!(fork_tip.root_id, genesis.id);

        let storage = storage.read();
        assert_eq!(storage.highest_block().unwrap().unwrap().hash, fork_tip.hash);
        assert!(storage.share_chain(&fork_tip.hash, &genesis.hash).unwrap());
        assert!(!storage.share_chain(&fork_tip.hash, &main.hash).unwrap());
    }

    #[test]
    fn test_spends_are_judged_per_lineage() {
        let rules = Rules::for_testing();
        let storage = ledger(&rules);
        let genesis = mine_and_cache(&storage, &rules.empty_target, &rules, miner_a(), NOW - 30);
        let reward_key = genesis.events[0].outputs[0].key.clone();

        // Chain 1 spends the genesis reward
        let jump = jump_event(1, &rules, miner_a(), &[reward_key.as_str()], "sol");
        let spender = mine_on(&storage, &genesis.hash, miner_a(), NOW - 20, vec![jump]);
        check(&storage, &spender).unwrap();
        let spender = storage
            .write()
            .cache_block(spender, &rules)
            .unwrap()
            .into_block();

        // Spending it again on the same chain is a double spend
        let again = jump_event(1, &rules, miner_a(), &[reward_key.as_str()], "vega");
        let double = mine_on(&storage, &spender.hash, miner_a(), NOW - 10, vec![again]);
        assert!(matches!(
            check(&storage, &double),
            Err(ValidationError::DoubleSpend { key }) if key == reward_key
        ));

        // A sibling chain never saw the first spend
        let sibling_jump = jump_event(1, &rules, miner_a(), &[reward_key.as_str()], "vega");
        let sibling = mine_on(&storage, &genesis.hash, miner_a(), NOW - 9, vec![sibling_jump]);
        check(&storage, &sibling).unwrap();

        // Outputs that never existed are rejected outright
        let phantom_key = "ab".repeat(32);
        let phantom_jump = jump_event(1, &rules, miner_a(), &[phantom_key.as_str()], "sol");
        let phantom = mine_on(&storage, &spender.hash, miner_a(), NOW - 8, vec![phantom_jump]);
        assert!(matches!(
            check(&storage, &phantom),
            Err(ValidationError::UnknownInput { .. })
        ));
    }

    #[test]
    fn test_duplicate_input_within_block_is_rejected() {
        let rules = Rules::for_testing();
        let storage = ledger(&rules);
        let genesis = mine_and_cache(&storage, &rules.empty_target, &rules, miner_a(), NOW - 30);
        let reward_key = genesis.events[0].outputs[0].key.clone();

        let first = jump_event(1, &rules, miner_a(), &[reward_key.as_str()], "sol");
        let second = jump_event(2, &rules, miner_a(), &[reward_key.as_str()], "vega");
        let block = mine_on(&storage, &genesis.hash, miner_a(), NOW - 20, vec![first, second]);

        assert!(matches!(
            BlockValidator::new(rules).validate(&block, NOW),
            Err(ValidationError::DuplicateKey { field: "input", .. })
        ));
    }
}
