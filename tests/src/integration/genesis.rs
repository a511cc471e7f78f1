//! # Genesis Mining
//!
//! A node with no blocks mines a genesis block through the probe service.
//! The block must carry the start difficulty, hold only the reward event and
//! pass every validation stage, including after a trip through JSON.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{Block, EventOutput, EventType, FixedTimeSource, Rules};
    use sl_02_chain_storage::InMemoryLedgerStore;
    use sl_03_validation::{BlockContext, BlockValidator, ValidationError};
    use sl_04_block_production::{MinerConfig, MockBroadcaster, ParentSelector, ProbeService};

    use crate::fixtures::{account, ledger, miner_a, NOW};

    fn probe_service(rules: &Rules) -> ProbeService<InMemoryLedgerStore> {
        let storage = ledger(rules);
        storage
            .write()
            .create_account(account("miner", miner_a()))
            .unwrap();
        ProbeService::new(
            storage,
            Arc::new(MockBroadcaster::new(0)),
            Arc::new(FixedTimeSource::new(NOW)),
            MinerConfig::for_testing(),
        )
    }

    #[tokio::test]
    async fn test_genesis_block_validates() {
        let rules = Rules::for_testing();
        let service = probe_service(&rules);

        let report = service.probe(ParentSelector::Genesis).await.unwrap();
        let block = report.block;

        assert_eq!(block.previous_hash, rules.empty_target);
        assert_eq!(block.height, 0);
        assert_eq!(block.difficulty, rules.difficulty_start);
        assert!(!report.forked);

        assert_eq!(block.events.len(), 1);
        let reward = &block.events[0];
        assert_eq!(reward.event_type, EventType::Reward);
        assert!(reward.inputs.is_empty());
        let credited: u64 = reward.outputs.iter().map(|o| o.amount()).sum();
        assert_eq!(credited, rules.probe_reward);

        let validator = BlockValidator::new(rules.clone());
        validator
            .validate_in_context(&block, &BlockContext::genesis(&rules), NOW)
            .unwrap();
    }

    #[tokio::test]
    async fn test_revalidation_after_json_roundtrip() {
        let rules = Rules::for_testing();
        let service = probe_service(&rules);
        let block = service.probe(ParentSelector::Genesis).await.unwrap().block;

        let wire = serde_json::to_string(&block).unwrap();
        let received: Block = serde_json::from_str(&wire).unwrap();

        let validator = BlockValidator::new(rules);
        validator.validate(&received, NOW).unwrap();
        validator.validate(&received, NOW).unwrap();
        assert_eq!(received.compute_hash(), block.hash);
    }

    #[tokio::test]
    async fn test_tampered_genesis_is_rejected() {
        let rules = Rules::for_testing();
        let service = probe_service(&rules);
        let block = service.probe(ParentSelector::Genesis).await.unwrap().block;
        let validator = BlockValidator::new(rules);

        let mut meta_changed = block.clone();
        meta_changed.meta = "rewritten".to_string();
        assert!(matches!(
            validator.validate(&meta_changed, NOW),
            Err(ValidationError::HashMismatch { .. })
        ));

        let mut greedy = block.clone();
        greedy.events[0].outputs[0] = EventOutput::reward(0, miner_a().fleet_hash(), 1_000);
        assert!(validator.validate(&greedy, NOW).is_err());

        assert!(matches!(
            validator.validate(&block, NOW - 3_600),
            Err(ValidationError::FutureTimestamp { .. })
        ));
    }

    #[tokio::test]
    async fn test_genesis_requires_start_difficulty() {
        let rules = Rules::for_testing();
        let service = probe_service(&rules);
        let block = service.probe(ParentSelector::Genesis).await.unwrap().block;

        let stricter = Rules {
            difficulty_start: 0x1c00_ffff,
            ..rules
        };
        let context = BlockContext::genesis(&stricter);
        assert!(matches!(
            BlockValidator::new(stricter).validate_in_context(&block, &context, NOW),
            Err(ValidationError::DifficultyMismatch { .. })
        ));
    }
}
