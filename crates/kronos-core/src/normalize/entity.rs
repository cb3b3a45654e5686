//! The `Entity` capability trait and the built-in mapping entities.

use crate::errors::Result;
use crate::model::{CanonicalView, Value};
use std::any::Any;

/// Type name reported by a bare [`CanonicalView`] used as an entity.
pub const VIEW_TYPE_NAME: &str = "CanonicalView";

/// Something the tracker can normalize.
///
/// Every method but `type_name` and `as_any` is an optional capability.
/// The normalizer tries them in a fixed order: `as_view`, a registered
/// adapter, `to_view`, then `attributes` when reflection is enabled.
pub trait Entity: Any {
    /// Declared type name, used in snapshot keys and adapter lookup.
    fn type_name(&self) -> &str;

    /// Declared identity. Falsy values count as absent.
    fn entity_id(&self) -> Option<Value> {
        None
    }

    /// The entity is already a mapping.
    fn as_view(&self) -> Option<&CanonicalView> {
        None
    }

    /// Explicit conversion to a view.
    fn to_view(&self) -> Option<CanonicalView> {
        None
    }

    /// Attribute mapping for reflective normalization.
    fn attributes(&self) -> Option<Vec<(String, Attribute<'_>)>> {
        None
    }

    /// Concrete type access for adapter matching by `TypeId`.
    fn as_any(&self) -> &dyn Any;
}

/// One attribute exposed through [`Entity::attributes`].
pub enum Attribute<'a> {
    /// Plain value, copied as-is
    Value(Value),
    /// Nested entity, normalized recursively under the attribute's own key
    Entity(&'a dyn Entity),
    /// Sequence of nested entities
    Entities(Vec<&'a dyn Entity>),
}

impl<'a> Attribute<'a> {
    pub fn value(value: impl Into<Value>) -> Self {
        Attribute::Value(value.into())
    }
}

impl Entity for CanonicalView {
    fn type_name(&self) -> &str {
        VIEW_TYPE_NAME
    }

    fn as_view(&self) -> Option<&CanonicalView> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A plain record: a mapping with a declared type name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: CanonicalView,
}

impl Record {
    pub fn new(type_name: impl Into<String>, fields: CanonicalView) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Build a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `KronosError::Normalization` if `json` is not an object.
    pub fn from_json(type_name: impl Into<String>, json: serde_json::Value) -> Result<Self> {
        Ok(Self::new(type_name, CanonicalView::from_json(json)?))
    }

    pub fn fields(&self) -> &CanonicalView {
        &self.fields
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key, value)
    }

    /// Remove a field, returning its value.
    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }
}

impl Entity for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn as_view(&self) -> Option<&CanonicalView> {
        Some(&self.fields)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
