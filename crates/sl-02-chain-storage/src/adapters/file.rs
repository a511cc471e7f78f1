//! JSON snapshot persistence.

use shared_types::Rules;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::memory::InMemoryLedgerStore;
use crate::domain::Result;
use crate::ports::outbound::{Repository, RulesStore, StoredEntity};

/// File-backed ledger store.
///
/// Keeps every table in memory and rewrites a JSON snapshot after each
/// mutation. The snapshot is written to a temp file and renamed into place,
/// so a crash never leaves a half-written file behind.
pub struct FileBackedLedgerStore {
    inner: InMemoryLedgerStore,
    path: PathBuf,
}

impl FileBackedLedgerStore {
    /// Open the snapshot at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// - `Io` if the file exists but cannot be read
    /// - `Serialization` if the file is not a valid snapshot
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let inner = match std::fs::read(&path) {
            Ok(bytes) => {
                tracing::info!(
                    "[sl-02] 💾 Found existing snapshot: {} ({} bytes)",
                    path.display(),
                    bytes.len()
                );
                serde_json::from_slice(&bytes)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("[sl-02] 📁 No existing snapshot at {}", path.display());
                InMemoryLedgerStore::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { inner, path })
    }

    /// Snapshot location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec(&self.inner)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        tracing::trace!("[sl-02] Snapshot written ({} bytes)", bytes.len());
        Ok(())
    }
}

impl<T: StoredEntity> Repository<T> for FileBackedLedgerStore
where
    InMemoryLedgerStore: Repository<T>,
{
    fn write(&mut self, entity: T) -> Result<T> {
        let stored = Repository::<T>::write(&mut self.inner, entity)?;
        self.save()?;
        Ok(stored)
    }

    fn read(&self, id: u64) -> Result<T> {
        Repository::<T>::read(&self.inner, id)
    }

    fn find_by(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>> {
        Repository::<T>::find_by(&self.inner, predicate)
    }

    fn count(&self) -> Result<usize> {
        Repository::<T>::count(&self.inner)
    }

    fn remove(&mut self, id: u64) -> Result<()> {
        Repository::<T>::remove(&mut self.inner, id)?;
        self.save()
    }
}

impl RulesStore for FileBackedLedgerStore {
    fn find_rules(&self) -> Result<Option<Rules>> {
        self.inner.find_rules()
    }

    fn write_rules(&mut self, rules: Rules) -> Result<()> {
        self.inner.write_rules(rules)?;
        self.save()
    }

    fn drop_rules(&mut self) -> Result<()> {
        self.inner.drop_rules()?;
        self.save()
    }
}
