//! Tracking decorator over a data-access layer.
//!
//! Every entity read through a [`TrackedRepository`] is tracked, so a later
//! `save` logs exactly what the caller changed in between.

use crate::change_log::{ChangeKind, ChangeLogger};
use crate::errors::Result;
use crate::model::Metadata;
use crate::normalize::entity::Entity;
use crate::store::SnapshotStore;
use crate::tracker::Tracker;

/// Generic data access for one entity type.
pub trait EntityRepository {
    type Entity: Entity;
    type Id: ?Sized;
    type Query: ?Sized;

    /// # Errors
    ///
    /// Backend-specific.
    fn get_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;

    /// # Errors
    ///
    /// Backend-specific.
    fn get_one(&self, query: &Self::Query) -> Result<Option<Self::Entity>>;

    /// # Errors
    ///
    /// Backend-specific.
    fn get_many(&self, query: &Self::Query) -> Result<Vec<Self::Entity>>;

    /// Persist `entity`, returning the stored form.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn save(&self, entity: Self::Entity) -> Result<Self::Entity>;

    /// # Errors
    ///
    /// Backend-specific.
    fn delete(&self, entity: Self::Entity) -> Result<()>;
}

/// Wraps a repository so reads start tracking and writes log changes.
#[derive(Debug)]
pub struct TrackedRepository<R, S, L> {
    inner: R,
    tracker: Tracker<S, L>,
}

impl<R, S, L> TrackedRepository<R, S, L>
where
    R: EntityRepository,
    S: SnapshotStore,
    L: ChangeLogger,
{
    pub fn new(inner: R, tracker: Tracker<S, L>) -> Self {
        Self { inner, tracker }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn tracker(&self) -> &Tracker<S, L> {
        &self.tracker
    }

    /// # Errors
    ///
    /// Repository errors, or `KronosError::Conflict` if the entity is
    /// already tracked with unlogged changes.
    pub fn get_by_id(&self, id: &R::Id) -> Result<Option<R::Entity>> {
        let entity = self.inner.get_by_id(id)?;
        if let Some(entity) = &entity {
            self.tracker.track_entity(entity, false)?;
        }
        Ok(entity)
    }

    /// # Errors
    ///
    /// See [`get_by_id`](Self::get_by_id).
    pub fn get_one(&self, query: &R::Query) -> Result<Option<R::Entity>> {
        let entity = self.inner.get_one(query)?;
        if let Some(entity) = &entity {
            self.tracker.track_entity(entity, false)?;
        }
        Ok(entity)
    }

    /// # Errors
    ///
    /// See [`get_by_id`](Self::get_by_id). Tracking stops at the first
    /// failing entity.
    pub fn get_many(&self, query: &R::Query) -> Result<Vec<R::Entity>> {
        let entities = self.inner.get_many(query)?;
        for entity in &entities {
            self.tracker.track_entity(entity, false)?;
        }
        Ok(entities)
    }

    /// Log the entity's changes, then save it.
    ///
    /// # Errors
    ///
    /// Tracking errors abort before the repository is called.
    pub fn save(&self, entity: R::Entity, metadata: &Metadata) -> Result<R::Entity> {
        self.tracker
            .log_changes(&entity, ChangeKind::Updated, metadata)?;
        self.inner.save(entity)
    }

    /// Log the deletion, then delete.
    ///
    /// # Errors
    ///
    /// Tracking errors abort before the repository is called.
    pub fn delete(&self, entity: R::Entity, metadata: &Metadata) -> Result<()> {
        self.tracker
            .log_changes(&entity, ChangeKind::Deleted, metadata)?;
        self.inner.delete(entity)
    }
}
