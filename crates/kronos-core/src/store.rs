//! Snapshot store interface and the in-memory implementation.

use crate::errors::{KronosError, Result};
use crate::model::CanonicalView;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Key → last known canonical view.
///
/// Implementations must be safe to share between threads; the tracker
/// serializes access per key, not per store.
pub trait SnapshotStore: Send + Sync {
    /// Whether a snapshot exists for `key`.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::Store` if the backend cannot be read.
    fn has_key(&self, key: &str) -> Result<bool>;

    /// The snapshot stored for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::Store` if the backend cannot be read or the
    /// stored snapshot cannot be decoded.
    fn get(&self, key: &str) -> Result<Option<CanonicalView>>;

    /// Store `view` at `key`, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::Store` if the write fails.
    fn save(&self, key: &str, view: &CanonicalView) -> Result<()>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn has_key(&self, key: &str) -> Result<bool> {
        (**self).has_key(key)
    }

    fn get(&self, key: &str) -> Result<Option<CanonicalView>> {
        (**self).get(key)
    }

    fn save(&self, key: &str, view: &CanonicalView) -> Result<()> {
        (**self).save(key, view)
    }
}

/// Process-local snapshot store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<String, CanonicalView>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(op: &str) -> KronosError {
    KronosError::Store {
        op: op.to_string(),
        message: "snapshot lock poisoned".to_string(),
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn has_key(&self, key: &str) -> Result<bool> {
        let snapshots = self.snapshots.read().map_err(|_| poisoned("has_key"))?;
        Ok(snapshots.contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<CanonicalView>> {
        let snapshots = self.snapshots.read().map_err(|_| poisoned("get"))?;
        Ok(snapshots.get(key).cloned())
    }

    fn save(&self, key: &str, view: &CanonicalView) -> Result<()> {
        let mut snapshots = self.snapshots.write().map_err(|_| poisoned("save"))?;
        snapshots.insert(key.to_string(), view.clone());
        Ok(())
    }
}
