//! Chain context a block is validated against.

use shared_types::{Block, Rules, SpendIndex};

/// What the local chain knows about a block's position.
///
/// Built by chain storage from the parent's lineage: the parent itself, the
/// difficulty the lineage requires next and the spend index of the
/// ancestry.
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    /// Parent block, `None` for genesis or when the parent is unknown.
    pub parent: Option<Block>,
    /// Packed difficulty the block must carry.
    pub expected_difficulty: u32,
    /// Outputs created and consumed by the ancestry.
    pub spends: SpendIndex,
}

impl BlockContext {
    /// Context of a genesis block.
    pub fn genesis(rules: &Rules) -> Self {
        Self {
            parent: None,
            expected_difficulty: rules.difficulty_start,
            spends: SpendIndex::new(),
        }
    }

    /// Context of a child of `parent`.
    pub fn child_of(parent: Block, expected_difficulty: u32, spends: SpendIndex) -> Self {
        Self {
            parent: Some(parent),
            expected_difficulty,
            spends,
        }
    }
}
