//! # Outbound Ports (Driven Ports)
//!
//! The persistence collaborator the chain storage service requires. Every
//! table speaks the same typed contract: `write`, `read`, `find_by`, `count`
//! and `remove`. Rules are a single optional row.
//!
//! Production: `FileBackedLedgerStore` (JSON snapshot on disk)
//! Testing: `InMemoryLedgerStore`

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Account, Block, Node, Rules};

use crate::domain::Result;

/// A record with a locally assigned id.
pub trait StoredEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table name, used in error messages.
    const KIND: &'static str;

    /// Local id, `None` until first written.
    fn id(&self) -> Option<u64>;

    /// Set the local id.
    fn assign_id(&mut self, id: u64);
}

impl StoredEntity for Block {
    const KIND: &'static str = "block";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl StoredEntity for Node {
    const KIND: &'static str = "node";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl StoredEntity for Account {
    const KIND: &'static str = "account";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

/// Typed table access.
pub trait Repository<T: StoredEntity>: Send + Sync {
    /// Insert when the entity has no id, otherwise replace the row.
    ///
    /// Returns the stored entity with its id assigned.
    fn write(&mut self, entity: T) -> Result<T>;

    /// Row by id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no row has this id
    fn read(&self, id: u64) -> Result<T>;

    /// Every row matching `predicate`, in id order.
    fn find_by(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>>;

    /// Number of rows.
    fn count(&self) -> Result<usize>;

    /// Delete a row.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no row has this id
    fn remove(&mut self, id: u64) -> Result<()>;
}

/// The single persisted [`Rules`] row.
pub trait RulesStore: Send + Sync {
    /// Rules adopted so far, if any.
    fn find_rules(&self) -> Result<Option<Rules>>;

    /// Replace the rules row.
    fn write_rules(&mut self, rules: Rules) -> Result<()>;

    /// Forget the adopted rules.
    fn drop_rules(&mut self) -> Result<()>;
}

/// Everything the chain storage service persists.
pub trait LedgerStore: Repository<Block> + Repository<Node> + Repository<Account> + RulesStore {}

impl<T> LedgerStore for T where
    T: Repository<Block> + Repository<Node> + Repository<Account> + RulesStore
{
}
