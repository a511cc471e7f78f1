//! Adapters implementing the [`LedgerStore`](crate::ports::LedgerStore) port.

pub mod file;
pub mod memory;

pub use file::FileBackedLedgerStore;
pub use memory::InMemoryLedgerStore;
