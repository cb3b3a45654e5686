//! Structural diff output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! The serde form keeps the tagged [`Value`] encoding; use
//! [`Diff::to_log_safe`] for what goes into a change log.

use crate::model::{Metadata, Value};
use serde::{Deserialize, Serialize};

/// What a [`Change`] is keyed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum ChangeKey {
    /// A field of the enclosing view
    Field(String),
    /// A correlation id inside an entity-valued list
    Id(Value),
    /// A member of a scalar list; carries no key
    Element,
}

impl ChangeKey {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ChangeKey::Field(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for ChangeKey {
    fn from(name: &str) -> Self {
        ChangeKey::Field(name.to_string())
    }
}

/// A leaf-level difference.
///
/// `value` is `None` for deletions and `old_value` is `None` for additions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub key: ChangeKey,
    pub value: Option<Value>,
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Change {
    pub fn new(key: ChangeKey, value: Option<Value>, old_value: Option<Value>) -> Self {
        Self {
            key,
            value,
            old_value,
            metadata: Metadata::new(),
        }
    }

    pub fn added(key: ChangeKey, value: Value) -> Self {
        Self::new(key, Some(value), None)
    }

    pub fn deleted(key: ChangeKey, old_value: Value) -> Self {
        Self::new(key, None, Some(old_value))
    }

    pub fn updated(key: ChangeKey, value: Value, old_value: Value) -> Self {
        Self::new(key, Some(value), Some(old_value))
    }
}

/// An entry in [`Diff::updated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Update {
    /// A scalar field whose value changed
    Field(Change),
    /// A nested entity or list field with its own diff
    Nested(Diff),
}

impl Update {
    pub fn as_change(&self) -> Option<&Change> {
        match self {
            Update::Field(change) => Some(change),
            Update::Nested(_) => None,
        }
    }

    pub fn as_diff(&self) -> Option<&Diff> {
        match self {
            Update::Nested(diff) => Some(diff),
            Update::Field(_) => None,
        }
    }
}

/// Structural difference between two canonical views.
///
/// A nested diff names its containing field in `field_name`; a per-element
/// diff inside an entity-valued list carries the element's `correlation_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub field_name: Option<String>,
    pub correlation_id: Option<Value>,
    pub added: Vec<Change>,
    pub deleted: Vec<Change>,
    pub updated: Vec<Update>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Diff {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing was added, deleted or updated.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }

    /// Re-label this diff as the diff of field `name`.
    pub fn for_field(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    /// Re-label this diff as the diff of the list element with id `id`.
    pub fn for_element(mut self, id: Value) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The scalar change recorded for `field` in `updated`, if any.
    pub fn updated_field(&self, field: &str) -> Option<&Change> {
        self.updated
            .iter()
            .filter_map(Update::as_change)
            .find(|c| c.key.field_name() == Some(field))
    }

    /// The nested diff recorded for `field` in `updated`, if any.
    pub fn nested(&self, field: &str) -> Option<&Diff> {
        self.updated
            .iter()
            .filter_map(Update::as_diff)
            .find(|d| d.field_name.as_deref() == Some(field))
    }

    /// Total number of leaf changes, counting through nested diffs.
    pub fn change_count(&self) -> usize {
        let nested: usize = self
            .updated
            .iter()
            .map(|u| match u {
                Update::Field(_) => 1,
                Update::Nested(d) => d.change_count(),
            })
            .sum();
        self.added.len() + self.deleted.len() + nested
    }
}
