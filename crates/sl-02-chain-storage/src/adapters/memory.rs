//! In-memory ledger tables.

use serde::{Deserialize, Serialize};
use shared_types::{Account, Block, Node, Rules};
use std::collections::BTreeMap;

use crate::domain::{Result, StorageError};
use crate::ports::outbound::{Repository, RulesStore, StoredEntity};

/// Rows of one entity type keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: StoredEntity> Table<T> {
    fn write(&mut self, mut entity: T) -> T {
        let id = match entity.id() {
            Some(id) => id,
            None => {
                let id = self.next_id;
                entity.assign_id(id);
                id
            }
        };
        self.next_id = self.next_id.max(id + 1);
        self.rows.insert(id, entity.clone());
        entity
    }

    fn read(&self, id: u64) -> Result<T> {
        self.rows
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(T::KIND, id))
    }

    fn find_by(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| predicate(row)).cloned().collect()
    }

    fn remove(&mut self, id: u64) -> Result<()> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(T::KIND, id))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// In-memory ledger store for testing and ephemeral nodes.
///
/// Also the snapshot format of [`super::FileBackedLedgerStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedgerStore {
    blocks: Table<Block>,
    nodes: Table<Node>,
    accounts: Table<Account>,
    rules: Option<Rules>,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

macro_rules! impl_repository {
    ($entity:ty, $table:ident) => {
        impl Repository<$entity> for InMemoryLedgerStore {
            fn write(&mut self, entity: $entity) -> Result<$entity> {
                Ok(self.$table.write(entity))
            }

            fn read(&self, id: u64) -> Result<$entity> {
                self.$table.read(id)
            }

            fn find_by(&self, predicate: &dyn Fn(&$entity) -> bool) -> Result<Vec<$entity>> {
                Ok(self.$table.find_by(predicate))
            }

            fn count(&self) -> Result<usize> {
                Ok(self.$table.len())
            }

            fn remove(&mut self, id: u64) -> Result<()> {
                self.$table.remove(id)
            }
        }
    };
}

impl_repository!(Block, blocks);
impl_repository!(Node, nodes);
impl_repository!(Account, accounts);

impl RulesStore for InMemoryLedgerStore {
    fn find_rules(&self) -> Result<Option<Rules>> {
        Ok(self.rules.clone())
    }

    fn write_rules(&mut self, rules: Rules) -> Result<()> {
        self.rules = Some(rules);
        Ok(())
    }

    fn drop_rules(&mut self) -> Result<()> {
        self.rules = None;
        Ok(())
    }
}
