//! # Spend Index
//!
//! Output keys created and consumed along one lineage. Chain storage builds
//! it by walking a block's ancestry; validation uses it to reject inputs
//! that reference unknown or already consumed outputs.

use std::collections::HashSet;

use crate::entities::Block;

/// Created and consumed output keys of a lineage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpendIndex {
    created: HashSet<String>,
    consumed: HashSet<String>,
}

impl SpendIndex {
    /// Empty index, the state before genesis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one block into the index.
    pub fn record_block(&mut self, block: &Block) {
        for output in block.outputs() {
            self.created.insert(output.key.clone());
        }
        for key in block.input_keys() {
            self.consumed.insert(key.to_string());
        }
    }

    /// An output with this key exists in the lineage.
    pub fn is_created(&self, key: &str) -> bool {
        self.created.contains(key)
    }

    /// An input already consumed this key.
    pub fn is_consumed(&self, key: &str) -> bool {
        self.consumed.contains(key)
    }

    /// Created and not yet consumed.
    pub fn is_unspent(&self, key: &str) -> bool {
        self.is_created(key) && !self.is_consumed(key)
    }

    /// Number of outputs created in the lineage.
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}
