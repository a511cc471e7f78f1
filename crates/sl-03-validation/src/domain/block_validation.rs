//! Block Validation Service - Pure Domain Logic
//!
//! Re-derives every commitment a block makes, in a fixed order so the
//! first failure reported is deterministic:
//!
//! 1. Hash-shaped fields are lowercase hex SHA-256
//! 2. Time is not ahead of the local clock
//! 3. Version, meta length and meta hash
//! 4. Event indices are unique and the events hash matches
//! 5. Header hash matches and meets the claimed difficulty
//! 6. Every event validates on its own
//! 7. Input and output keys are unique across the block
//! 8. Reward outputs stay within the per-block budget

use shared_crypto::sha256_hex;
use shared_types::{Block, EventType, Rules, SpendIndex, Timestamp, MAX_META_BYTES};
use sl_01_difficulty::Target;
use std::collections::HashSet;
use tracing::debug;

use super::context::BlockContext;
use super::errors::{Result, ValidationError};
use super::event_validation::{check_hash, check_unique_indices, validate_event};
use crate::config::ValidationConfig;

/// Pure domain service for block validation.
///
/// Holds the consensus rules a node adopted; state (parents, spends) is
/// passed in by the caller.
#[derive(Debug, Clone)]
pub struct BlockValidator {
    rules: Rules,
    config: ValidationConfig,
}

impl BlockValidator {
    /// Validator for `rules` with the default configuration.
    pub fn new(rules: Rules) -> Self {
        Self::with_config(rules, ValidationConfig::default())
    }

    /// Validator with an explicit configuration.
    pub fn with_config(rules: Rules, config: ValidationConfig) -> Self {
        Self { rules, config }
    }

    /// Rules this validator enforces.
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Context-free validation of a block at local time `now`.
    #[tracing::instrument(skip(self, block), fields(height = block.height))]
    pub fn validate(&self, block: &Block, now: Timestamp) -> Result<()> {
        check_hash("hash", &block.hash)?;
        check_hash("previous_hash", &block.previous_hash)?;
        check_hash("events_hash", &block.events_hash)?;
        check_hash("meta_hash", &block.meta_hash)?;

        if block.time > now.saturating_add(self.config.max_future_drift_secs) {
            return Err(ValidationError::FutureTimestamp {
                time: block.time,
                now,
            });
        }

        if block.version != self.rules.version {
            return Err(ValidationError::VersionMismatch {
                field: "version".to_string(),
                expected: self.rules.version,
                actual: block.version,
            });
        }
        if block.meta.len() > MAX_META_BYTES {
            return Err(ValidationError::MetaTooLong {
                length: block.meta.len(),
                max: MAX_META_BYTES,
            });
        }
        let meta_hash = sha256_hex(&block.meta);
        if meta_hash != block.meta_hash {
            return Err(ValidationError::HashMismatch {
                field: "meta_hash".to_string(),
                expected: meta_hash,
                actual: block.meta_hash.clone(),
            });
        }

        check_unique_indices("events", block.events.iter().map(|e| e.index))?;
        let events_hash = Block::compute_events_hash(&block.events);
        if events_hash != block.events_hash {
            return Err(ValidationError::HashMismatch {
                field: "events_hash".to_string(),
                expected: events_hash,
                actual: block.events_hash.clone(),
            });
        }

        let hash = block.compute_hash();
        if hash != block.hash {
            return Err(ValidationError::HashMismatch {
                field: "hash".to_string(),
                expected: hash,
                actual: block.hash.clone(),
            });
        }
        let target = Target::from_difficulty(block.difficulty, self.rules.difficulty_fudge)?;
        if !target.is_met_by(&block.hash) {
            return Err(ValidationError::DifficultyNotMet {
                hash: block.hash.clone(),
                difficulty: block.difficulty,
            });
        }

        for event in &block.events {
            validate_event(event, &self.rules)?;
        }
        self.check_unique_keys(block)?;
        self.check_reward_budget(block)?;

        debug!("[sl-03] ✓ Block {} at height {} is valid", &block.hash[..12], block.height);
        Ok(())
    }

    fn check_unique_keys(&self, block: &Block) -> Result<()> {
        let mut inputs = HashSet::new();
        for key in block.input_keys() {
            if !inputs.insert(key) {
                return Err(ValidationError::DuplicateKey {
                    field: "input",
                    key: key.to_string(),
                });
            }
        }
        let mut outputs = HashSet::new();
        for output in block.outputs() {
            if !outputs.insert(output.key.as_str()) {
                return Err(ValidationError::DuplicateKey {
                    field: "output",
                    key: output.key.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_reward_budget(&self, block: &Block) -> Result<()> {
        let budget = self.rules.probe_reward;
        let mut claimed: u64 = 0;
        for event in block.events.iter().filter(|e| e.event_type == EventType::Reward) {
            for output in &event.outputs {
                claimed = claimed.saturating_add(output.amount());
                if claimed > budget {
                    return Err(ValidationError::RewardExceeded { claimed, budget });
                }
            }
        }
        Ok(())
    }

    /// Check height and difficulty against the parent.
    ///
    /// A genesis block points at the empty target, sits at height zero and
    /// carries `expected_difficulty` (the rules' start difficulty). Any
    /// other block needs its parent.
    pub fn validate_lineage(
        &self,
        block: &Block,
        parent: Option<&Block>,
        expected_difficulty: u32,
    ) -> Result<()> {
        let expected_height = if block.previous_hash == self.rules.empty_target {
            0
        } else {
            let parent = parent
                .filter(|p| p.hash == block.previous_hash)
                .ok_or_else(|| ValidationError::UnknownParent {
                    previous_hash: block.previous_hash.clone(),
                })?;
            parent.height + 1
        };

        if block.height != expected_height {
            return Err(ValidationError::InvalidHeight {
                expected: expected_height,
                actual: block.height,
            });
        }
        if block.difficulty != expected_difficulty {
            return Err(ValidationError::DifficultyMismatch {
                expected: expected_difficulty,
                actual: block.difficulty,
            });
        }
        Ok(())
    }

    /// Every input must consume an output the lineage created and has not
    /// consumed yet.
    pub fn validate_spends(&self, block: &Block, spends: &SpendIndex) -> Result<()> {
        for key in block.input_keys() {
            if !spends.is_created(key) {
                return Err(ValidationError::UnknownInput {
                    key: key.to_string(),
                });
            }
            if spends.is_consumed(key) {
                return Err(ValidationError::DoubleSpend {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Full validation: context-free checks, lineage, then spends.
    pub fn validate_in_context(
        &self,
        block: &Block,
        context: &BlockContext,
        now: Timestamp,
    ) -> Result<()> {
        self.validate(block, now)?;
        self.validate_lineage(block, context.parent.as_ref(), context.expected_difficulty)?;
        self.validate_spends(block, &context.spends)
    }
}
