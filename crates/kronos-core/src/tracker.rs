//! Snapshot-based change tracking.
//!
//! ## Logging Ownership
//!
//! The tracker owns lifecycle logging for its public operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success, with the entity key
//! - `log_op_error!` on failure
//!
//! Normalization, diffing and the collaborators use only `tracing::debug!()`.

use crate::change_log::{ChangeEvent, ChangeKind, ChangeLogger, MemoryChangeLog};
use crate::config::TrackerConfig;
use crate::diff::model::Diff;
use crate::digest::compute_view_digest;
use crate::errors::{KronosError, Result};
use crate::model::{CanonicalView, Metadata};
use crate::normalize::entity::Entity;
use crate::normalize::normalizer::EntityNormalizer;
use crate::store::{MemorySnapshotStore, SnapshotStore};
use crate::{log_op_end, log_op_error, log_op_start};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Per-entity-key mutual exclusion.
///
/// Callers on the same key run one at a time; distinct keys never contend
/// beyond the short map lookup.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or `KronosError::Internal` if the lock
    /// table is poisoned.
    pub fn with_key<T>(&self, key: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = {
            let mut locks = self.locks.lock().map_err(|_| KronosError::Internal {
                message: "key lock table poisoned".to_string(),
            })?;
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        let result = {
            // The guarded unit carries no data, so a poisoned lock is still usable.
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };

        if let Ok(mut locks) = self.locks.lock() {
            // Only the table and this caller hold it: nobody is waiting.
            if Arc::strong_count(&lock) == 2 {
                locks.remove(key);
            }
        }

        result
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Keeps the last known snapshot of each tracked entity and logs the
/// changes made since.
///
/// The store and logger are owned; share them across trackers by wrapping
/// them in an `Arc`.
#[derive(Debug)]
pub struct Tracker<S = MemorySnapshotStore, L = MemoryChangeLog> {
    normalizer: EntityNormalizer,
    store: S,
    logger: L,
    locks: KeyLocks,
}

impl Tracker<MemorySnapshotStore, MemoryChangeLog> {
    /// A tracker backed by the in-memory store and change log.
    pub fn in_memory(config: TrackerConfig) -> Self {
        Self::new(
            EntityNormalizer::new(config),
            MemorySnapshotStore::new(),
            MemoryChangeLog::new(),
        )
    }
}

impl<S: SnapshotStore, L: ChangeLogger> Tracker<S, L> {
    pub fn new(normalizer: EntityNormalizer, store: S, logger: L) -> Self {
        Self {
            normalizer,
            store,
            logger,
            locks: KeyLocks::new(),
        }
    }

    pub fn normalizer(&self) -> &EntityNormalizer {
        &self.normalizer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// The snapshot key of `entity`: `"{type_name}-{id}"`.
    ///
    /// Entities without a truthy identity use the SHA-256 digest of their
    /// canonical view as id.
    ///
    /// # Errors
    ///
    /// Propagates normalization errors.
    pub fn entity_key(&self, entity: &dyn Entity) -> Result<String> {
        let view = self.normalizer.entity_to_view(entity)?;
        self.key_for(entity, &view)
    }

    fn key_for(&self, entity: &dyn Entity, view: &CanonicalView) -> Result<String> {
        let id = match self.normalizer.entity_id(entity, view) {
            Some(id) => id.key_string(),
            None => compute_view_digest(view)?,
        };
        Ok(format!("{}-{}", entity.type_name(), id))
    }

    /// Start tracking `entity` by storing its current snapshot.
    ///
    /// `overwrite` is the override flag: when set, any existing snapshot is
    /// replaced unconditionally. When unset, an existing snapshot that
    /// differs from the entity's current state is left untouched and the
    /// call fails.
    ///
    /// # Errors
    ///
    /// - `KronosError::Conflict` if the stored snapshot has unlogged changes
    /// - normalization and store errors
    pub fn track_entity(&self, entity: &dyn Entity, overwrite: bool) -> Result<()> {
        log_op_start!(
            "track_entity",
            entity_type = entity.type_name(),
            overwrite = overwrite
        );
        let start = Instant::now();

        let entity_key = self.track_entity_impl(entity, overwrite).map_err(|e| {
            log_op_error!(
                "track_entity",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                entity_type = entity.type_name()
            );
            e
        })?;

        log_op_end!(
            "track_entity",
            duration_ms = start.elapsed().as_millis() as u64,
            entity_key = entity_key.as_str()
        );

        Ok(())
    }

    fn track_entity_impl(&self, entity: &dyn Entity, overwrite: bool) -> Result<String> {
        let view = self.normalizer.entity_to_view(entity)?;
        let entity_key = self.key_for(entity, &view)?;

        self.locks.with_key(&entity_key, || {
            if !overwrite {
                if let Some(stored) = self.store.get(&entity_key)? {
                    if stored != view {
                        return Err(KronosError::Conflict {
                            entity_key: entity_key.clone(),
                        });
                    }
                }
            }
            self.store.save(&entity_key, &view)
        })?;

        Ok(entity_key)
    }

    /// Diff the entity's current state against its tracked snapshot.
    ///
    /// Returns `None` if the entity is not tracked.
    ///
    /// # Errors
    ///
    /// Propagates normalization and store errors.
    pub fn get_entity_diff(&self, entity: &dyn Entity) -> Result<Option<Diff>> {
        log_op_start!("get_entity_diff", entity_type = entity.type_name());
        let start = Instant::now();

        let (entity_key, diff) = self.entity_diff_impl(entity).map_err(|e| {
            log_op_error!(
                "get_entity_diff",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                entity_type = entity.type_name()
            );
            e
        })?;

        log_op_end!(
            "get_entity_diff",
            duration_ms = start.elapsed().as_millis() as u64,
            entity_key = entity_key.as_str(),
            tracked = diff.is_some()
        );

        Ok(diff)
    }

    fn entity_diff_impl(&self, entity: &dyn Entity) -> Result<(String, Option<Diff>)> {
        let view = self.normalizer.entity_to_view(entity)?;
        let entity_key = self.key_for(entity, &view)?;
        let diff = self.diff_against_snapshot(entity, &entity_key, &view)?;
        Ok((entity_key, diff))
    }

    fn diff_against_snapshot(
        &self,
        entity: &dyn Entity,
        entity_key: &str,
        view: &CanonicalView,
    ) -> Result<Option<Diff>> {
        Ok(self.store.get(entity_key)?.map(|previous| {
            self.normalizer
                .diff_views(entity, view, &previous, &Metadata::new())
        }))
    }

    /// Log the entity's changes and advance its snapshot.
    ///
    /// - `Created`: every field is reported as added; the snapshot is not
    ///   touched.
    /// - `Deleted`: the logger receives no diff; the snapshot is kept.
    /// - `Updated`: a non-empty diff against the snapshot is logged and the
    ///   snapshot replaced. Untracked or unchanged entities log nothing.
    ///
    /// `metadata` travels with the log event.
    ///
    /// # Errors
    ///
    /// Propagates normalization, store and change log errors.
    pub fn log_changes(
        &self,
        entity: &dyn Entity,
        kind: ChangeKind,
        metadata: &Metadata,
    ) -> Result<Option<Diff>> {
        log_op_start!(
            "log_changes",
            entity_type = entity.type_name(),
            kind = kind.as_str()
        );
        let start = Instant::now();

        let (entity_key, diff) = self.log_changes_impl(entity, kind, metadata).map_err(|e| {
            log_op_error!(
                "log_changes",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                entity_type = entity.type_name()
            );
            e
        })?;

        log_op_end!(
            "log_changes",
            duration_ms = start.elapsed().as_millis() as u64,
            entity_key = entity_key.as_str(),
            changes = diff.as_ref().map_or(0, Diff::change_count) as u64
        );

        Ok(diff)
    }

    fn log_changes_impl(
        &self,
        entity: &dyn Entity,
        kind: ChangeKind,
        metadata: &Metadata,
    ) -> Result<(String, Option<Diff>)> {
        let view = self.normalizer.entity_to_view(entity)?;
        let entity_key = self.key_for(entity, &view)?;

        let diff = match kind {
            ChangeKind::Created => {
                let diff = self.normalizer.diff_views(
                    entity,
                    &view,
                    &CanonicalView::new(),
                    &Metadata::new(),
                );
                self.emit(entity, &entity_key, Some(&diff), kind, metadata)?;
                Some(diff)
            }
            ChangeKind::Deleted => {
                self.emit(entity, &entity_key, None, kind, metadata)?;
                None
            }
            ChangeKind::Updated => self.locks.with_key(&entity_key, || {
                let diff = self.diff_against_snapshot(entity, &entity_key, &view)?;
                if let Some(diff) = diff.as_ref().filter(|d| !d.is_empty()) {
                    self.emit(entity, &entity_key, Some(diff), kind, metadata)?;
                    self.store.save(&entity_key, &view)?;
                }
                Ok(diff)
            })?,
        };

        Ok((entity_key, diff))
    }

    fn emit(
        &self,
        entity: &dyn Entity,
        entity_key: &str,
        diff: Option<&Diff>,
        kind: ChangeKind,
        metadata: &Metadata,
    ) -> Result<()> {
        tracing::debug!(entity_key, kind = kind.as_str(), "emitting change event");
        self.logger.log(ChangeEvent {
            entity_type: entity.type_name(),
            entity_key,
            diff,
            kind,
            metadata,
        })
    }
}
