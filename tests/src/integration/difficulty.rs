//! # Difficulty Along a Lineage
//!
//! Every `difficulty_interval` blocks the required difficulty is scaled by
//! how long the previous interval took. Chain storage computes it, the
//! miner stamps it and validation insists on it.

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use shared_types::{Block, FixedTimeSource, Rules};
    use sl_01_difficulty::{decode_compact, recalculate, Target, EASIEST_DIFFICULTY};
    use sl_03_validation::{BlockContext, BlockValidator, ValidationError};
    use sl_04_block_production::{reward_event, search_nonce, SearchLimits};

    use crate::fixtures::{chain_of, miner_a, mine, NOW};

    fn context_of(
        storage: &sl_02_chain_storage::ChainStorageService<sl_02_chain_storage::InMemoryLedgerStore>,
        block: &Block,
        rules: &Rules,
    ) -> BlockContext {
        BlockContext::child_of(
            storage.find_block_by_hash(&block.previous_hash).unwrap().unwrap(),
            storage.next_difficulty(&block.previous_hash, rules).unwrap(),
            storage.spend_index(&block.previous_hash, rules).unwrap(),
        )
    }

    #[test]
    fn test_fast_interval_raises_difficulty() {
        let rules = Rules::for_testing();
        let (storage, blocks) = chain_of(rules.difficulty_interval + 1, 1, &rules, miner_a());

        let anchor = &blocks[0];
        let parent = &blocks[9];
        let retargeted = &blocks[10];
        let expected = recalculate(anchor.difficulty, parent.time - anchor.time, &rules).unwrap();

        assert!(blocks[1..10].iter().all(|b| b.difficulty == rules.difficulty_start));
        assert_eq!(retargeted.difficulty, expected);
        assert!(decode_compact(retargeted.difficulty) < decode_compact(rules.difficulty_start));
        assert_eq!(retargeted.interval_id, anchor.id);

        let storage = storage.read();
        BlockValidator::new(rules.clone())
            .validate_in_context(retargeted, &context_of(&storage, retargeted, &rules), NOW)
            .unwrap();
    }

    #[test]
    fn test_slow_interval_stays_at_easiest() {
        let rules = Rules::for_testing();
        let (_, blocks) = chain_of(rules.difficulty_interval + 1, 100, &rules, miner_a());

        assert_eq!(blocks[10].difficulty, EASIEST_DIFFICULTY);
    }

    #[test]
    fn test_stale_difficulty_is_rejected() {
        let rules = Rules::for_testing();
        let (storage, blocks) = chain_of(rules.difficulty_interval, 1, &rules, miner_a());
        let parent = &blocks[9];

        // Ignore the recalculation and keep the start difficulty
        let candidate = Block::candidate(
            parent.hash.clone(),
            parent.height + 1,
            rules.version,
            rules.difficulty_start,
            NOW,
            "stale",
            vec![reward_event(&rules, miner_a()).unwrap()],
        );
        let target = Target::from_difficulty(candidate.difficulty, rules.difficulty_fudge).unwrap();
        let limits = SearchLimits {
            maximum_nonce: rules.maximum_nonce,
            check_interval: 1_000_000,
            timeout_secs: 60,
        };
        let stale = search_nonce(
            candidate,
            &target,
            &limits,
            &FixedTimeSource::new(NOW),
            &AtomicBool::new(false),
        )
        .unwrap()
        .block;

        let storage = storage.read();
        let validator = BlockValidator::new(rules.clone());
        validator.validate(&stale, NOW).unwrap();
        assert!(matches!(
            validator.validate_in_context(&stale, &context_of(&storage, &stale, &rules), NOW),
            Err(ValidationError::DifficultyMismatch { .. })
        ));

        let honest = mine(&*storage, &parent.hash, &rules, miner_a(), NOW);
        validator
            .validate_in_context(&honest, &context_of(&storage, &honest, &rules), NOW)
            .unwrap();
    }

    #[test]
    fn test_zero_interval_never_retargets() {
        let rules = Rules {
            difficulty_interval: 0,
            ..Rules::for_testing()
        };
        let (_, blocks) = chain_of(12, 1, &rules, miner_a());
        assert!(blocks.iter().all(|b| b.difficulty == rules.difficulty_start));
    }
}
