//! Entity → canonical view conversion and entity-level diffing.

use crate::config::TrackerConfig;
use crate::diff::engine::DiffEngine;
use crate::diff::model::Diff;
use crate::errors::{KronosError, Result};
use crate::model::{CanonicalView, Metadata, Value};
use crate::normalize::adapter::{AdapterRegistry, EntityAdapter};
use crate::normalize::entity::{Attribute, Entity};

/// Turns entities into canonical views and diffs them.
///
/// Resolution order for [`entity_to_view`](Self::entity_to_view):
///
/// 1. the entity is already a mapping (`as_view`)
/// 2. a registered adapter supplying a normalization
/// 3. the entity's own `to_view`
/// 4. reflection over `attributes`, if enabled in the config
///
/// Anything else is a [`KronosError::Normalization`].
#[derive(Debug)]
pub struct EntityNormalizer {
    adapters: AdapterRegistry,
    engine: DiffEngine,
    config: TrackerConfig,
}

impl Default for EntityNormalizer {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl EntityNormalizer {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            adapters: AdapterRegistry::new(),
            engine: DiffEngine::new(config.identity_field.clone()),
            config,
        }
    }

    /// Register an adapter. Adapters registered first win.
    pub fn with_adapter(mut self, adapter: impl EntityAdapter + 'static) -> Self {
        self.register_adapter(Box::new(adapter));
        self
    }

    pub fn register_adapter(&mut self, adapter: Box<dyn EntityAdapter>) {
        self.adapters.register(adapter);
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn engine(&self) -> &DiffEngine {
        &self.engine
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// Normalize an entity.
    ///
    /// # Errors
    ///
    /// - `KronosError::Normalization` if no strategy applies
    /// - `KronosError::DepthExceeded` if reflection nests deeper than
    ///   `max_depth`
    /// - any error returned by an adapter
    pub fn entity_to_view(&self, entity: &dyn Entity) -> Result<CanonicalView> {
        self.normalize_at(entity, 0)
    }

    /// The entity's truthy identity, if any.
    ///
    /// For mappings this is the configured identity field of `view`. Other
    /// entities report it through [`Entity::entity_id`] and fall back to the
    /// identity field of their normalized view.
    pub fn entity_id(&self, entity: &dyn Entity, view: &CanonicalView) -> Option<Value> {
        let from_view = || {
            view.get(&self.config.identity_field)
                .filter(|id| id.is_truthy())
                .cloned()
        };
        if entity.as_view().is_some() {
            return from_view();
        }
        entity
            .entity_id()
            .filter(Value::is_truthy)
            .or_else(from_view)
    }

    /// Normalize both entities and diff them.
    ///
    /// An adapter registered for the type of `new` may override the diff.
    ///
    /// # Errors
    ///
    /// Propagates normalization errors from either side.
    pub fn diff(&self, new: &dyn Entity, old: &dyn Entity, metadata: &Metadata) -> Result<Diff> {
        let new_view = self.entity_to_view(new)?;
        let old_view = self.entity_to_view(old)?;
        Ok(self.diff_views(new, &new_view, &old_view, metadata))
    }

    /// Diff two already-normalized views of `entity`.
    pub fn diff_views(
        &self,
        entity: &dyn Entity,
        new: &CanonicalView,
        old: &CanonicalView,
        metadata: &Metadata,
    ) -> Diff {
        self.adapters
            .resolve(entity)
            .and_then(|adapter| adapter.diff(new, old, metadata))
            .unwrap_or_else(|| self.engine.diff(new, old, metadata))
    }

    fn normalize_at(&self, entity: &dyn Entity, depth: usize) -> Result<CanonicalView> {
        if let Some(view) = entity.as_view() {
            return Ok(view.clone());
        }

        if let Some(result) = self
            .adapters
            .resolve(entity)
            .and_then(|adapter| adapter.entity_to_view(entity))
        {
            return result;
        }

        if let Some(view) = entity.to_view() {
            return Ok(view);
        }

        if self.config.reflection {
            if let Some(attributes) = entity.attributes() {
                return self.reflect(entity, attributes, depth);
            }
        }

        Err(KronosError::Normalization {
            entity_type: entity.type_name().to_string(),
            reason: if self.config.reflection {
                "entity exposes neither a view nor attributes".to_string()
            } else {
                "entity must be a mapping, have an adapter or implement to_view".to_string()
            },
        })
    }

    fn reflect(
        &self,
        entity: &dyn Entity,
        attributes: Vec<(String, Attribute<'_>)>,
        depth: usize,
    ) -> Result<CanonicalView> {
        // `depth` counts reflected ancestors; the root sits at 0.
        if depth >= self.config.max_depth {
            return Err(KronosError::DepthExceeded {
                entity_type: entity.type_name().to_string(),
                max_depth: self.config.max_depth,
            });
        }

        let mut view = CanonicalView::new();
        for (name, attribute) in attributes {
            let value = match attribute {
                Attribute::Value(value) => value,
                Attribute::Entity(child) => Value::Map(self.normalize_at(child, depth + 1)?),
                Attribute::Entities(children) => Value::List(
                    children
                        .into_iter()
                        .map(|child| self.normalize_at(child, depth + 1).map(Value::Map))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            view.insert(name, value);
        }
        Ok(view)
    }
}
