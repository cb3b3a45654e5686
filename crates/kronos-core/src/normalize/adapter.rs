//! Per-type adapters and their registry.
//!
//! Adapters are matched against an entity's declared type name or its
//! concrete `TypeId`; the first registered match wins. Resolution results
//! are cached per `(TypeId, type name)` pair so each type is resolved once.

use crate::diff::model::Diff;
use crate::errors::Result;
use crate::model::{CanonicalView, Metadata};
use crate::normalize::entity::Entity;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Which entities an adapter applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterTarget {
    /// Entities whose `type_name()` equals this name
    Name(String),
    /// Entities of this concrete Rust type
    Type(TypeId),
}

impl AdapterTarget {
    pub fn name(name: impl Into<String>) -> Self {
        AdapterTarget::Name(name.into())
    }

    pub fn of<T: Any>() -> Self {
        AdapterTarget::Type(TypeId::of::<T>())
    }

    fn matches(&self, type_name: &str, type_id: TypeId) -> bool {
        match self {
            AdapterTarget::Name(name) => name == type_name,
            AdapterTarget::Type(id) => *id == type_id,
        }
    }
}

/// Strategy overriding normalization and/or diffing for one entity type.
///
/// Both hooks default to `None`, meaning "not overridden"; the generic
/// path then applies.
pub trait EntityAdapter: Send + Sync {
    fn target(&self) -> AdapterTarget;

    fn entity_to_view(&self, _entity: &dyn Entity) -> Option<Result<CanonicalView>> {
        None
    }

    fn diff(&self, _new: &CanonicalView, _old: &CanonicalView, _metadata: &Metadata) -> Option<Diff> {
        None
    }
}

/// Ordered adapter list with a per-type resolution cache.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<(AdapterTarget, Box<dyn EntityAdapter>)>,
    resolved: RwLock<HashMap<(TypeId, String), Option<usize>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adapter. Earlier registrations take precedence.
    pub fn register(&mut self, adapter: Box<dyn EntityAdapter>) {
        let target = adapter.target();
        self.adapters.push((target, adapter));
        // Registration is `&mut self`, so no reader can hold a stale entry.
        if let Ok(mut cache) = self.resolved.write() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Find the adapter for `entity`, if any.
    pub fn resolve(&self, entity: &dyn Entity) -> Option<&dyn EntityAdapter> {
        if self.adapters.is_empty() {
            return None;
        }

        let type_id = entity.as_any().type_id();
        let cache_key = (type_id, entity.type_name().to_string());

        let cached = self
            .resolved
            .read()
            .ok()
            .and_then(|cache| cache.get(&cache_key).copied());

        let index = match cached {
            Some(index) => index,
            None => {
                let index = self
                    .adapters
                    .iter()
                    .position(|(target, _)| target.matches(entity.type_name(), type_id));
                tracing::debug!(
                    entity_type = entity.type_name(),
                    adapter_index = ?index,
                    "resolved entity adapter"
                );
                if let Ok(mut cache) = self.resolved.write() {
                    cache.insert(cache_key, index);
                }
                index
            }
        };

        index.map(|i| self.adapters[i].1.as_ref())
    }

    /// Number of cached resolutions.
    pub fn cached_resolutions(&self) -> usize {
        self.resolved.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field(
                "targets",
                &self.adapters.iter().map(|(t, _)| t).collect::<Vec<_>>(),
            )
            .finish()
    }
}
