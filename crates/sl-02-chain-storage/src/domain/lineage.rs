//! # Lineage
//!
//! Local bookkeeping a block receives when it is cached: its height, fork
//! identifier, fork root and the interval block its difficulty derives from.
//! None of it is committed by the block hash.

use shared_types::Block;

/// Where a new block on top of a given parent sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    /// Parent height + 1, zero for genesis.
    pub height: u64,
    /// Local id of the parent.
    pub previous_id: Option<u64>,
    /// Fork identifier.
    pub chain: u64,
    /// Block the fork branched from.
    pub root_id: Option<u64>,
    /// Block of the last difficulty recalculation.
    pub interval_id: Option<u64>,
    /// Difficulty the new block must carry.
    pub difficulty: u32,
    /// Whether the block opens a new chain below an existing tip.
    pub forked: bool,
}

impl Lineage {
    /// Stamp the lineage onto a block.
    pub fn apply(&self, block: Block) -> Block {
        let mut block = block.with_lineage(self.previous_id, self.chain, self.root_id, self.interval_id);
        block.height = self.height;
        block
    }
}

/// Result of caching a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// First time this hash was seen.
    Inserted(Block),
    /// A block with this hash was already stored; it is returned unchanged.
    Existing(Block),
}

impl CacheOutcome {
    /// The stored record.
    pub fn block(&self) -> &Block {
        match self {
            CacheOutcome::Inserted(block) | CacheOutcome::Existing(block) => block,
        }
    }

    /// Consume into the stored record.
    pub fn into_block(self) -> Block {
        match self {
            CacheOutcome::Inserted(block) | CacheOutcome::Existing(block) => block,
        }
    }

    /// Whether the call inserted a new record.
    pub fn is_inserted(&self) -> bool {
        matches!(self, CacheOutcome::Inserted(_))
    }
}
