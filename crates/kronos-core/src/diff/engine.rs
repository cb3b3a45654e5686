//! Structural diff computation engine.
//!
//! The core entry point is [`DiffEngine::diff`], which compares two canonical
//! views and produces a [`Diff`]. The engine holds only configuration and is
//! safe to share between threads.

use crate::diff::model::{Change, ChangeKey, Diff, Update};
use crate::model::{CanonicalView, Metadata, Value};
use std::collections::{HashMap, HashSet};

/// Default identity field used to correlate list elements.
pub const DEFAULT_IDENTITY_FIELD: &str = "id";

/// Recursive structural differ.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    identity_field: String,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_FIELD)
    }
}

/// A list element that can take part in id correlation.
struct Correlated<'a> {
    key: String,
    id: &'a Value,
    view: &'a CanonicalView,
}

impl DiffEngine {
    /// Create an engine correlating list elements on `identity_field`.
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
        }
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    /// Compute the diff of `new` against `old`.
    ///
    /// `metadata` is attached to the top-level diff only. Never fails; two
    /// equal views produce an empty diff.
    pub fn diff(&self, new: &CanonicalView, old: &CanonicalView, metadata: &Metadata) -> Diff {
        self.diff_views(new, old).with_metadata(metadata.clone())
    }

    fn diff_views(&self, new: &CanonicalView, old: &CanonicalView) -> Diff {
        let mut diff = Diff::new();

        for (key, value) in new {
            if !old.contains_key(key) {
                diff.added
                    .push(Change::added(ChangeKey::Field(key.clone()), value.clone()));
            }
        }

        for (key, old_value) in old {
            if !new.contains_key(key) {
                diff.deleted
                    .push(Change::deleted(ChangeKey::Field(key.clone()), old_value.clone()));
            }
        }

        for (key, new_value) in new {
            let Some(old_value) = old.get(key) else {
                continue;
            };

            match (new_value, old_value) {
                (Value::List(new_items), Value::List(old_items)) => {
                    let sub = self.diff_lists(new_items, old_items);
                    if !sub.is_empty() {
                        diff.updated.push(Update::Nested(sub.for_field(key.clone())));
                    }
                }
                (Value::Map(new_view), Value::Map(old_view)) => {
                    let sub = self.diff_views(new_view, old_view);
                    if !sub.is_empty() {
                        diff.updated.push(Update::Nested(sub.for_field(key.clone())));
                    }
                }
                _ if new_value != old_value => {
                    diff.updated.push(Update::Field(Change::updated(
                        ChangeKey::Field(key.clone()),
                        new_value.clone(),
                        old_value.clone(),
                    )));
                }
                _ => {}
            }
        }

        diff
    }

    /// Diff two lists, choosing the mode from every element on both sides.
    ///
    /// Id correlation applies only when all elements are views carrying a
    /// unique truthy identity. Any other shape is diffed as a multiset.
    fn diff_lists(&self, new: &[Value], old: &[Value]) -> Diff {
        if new.is_empty() && old.is_empty() {
            return Diff::new();
        }

        match (self.correlate(new), self.correlate(old)) {
            (Some(new_elems), Some(old_elems)) => self.diff_correlated(&new_elems, &old_elems),
            _ => diff_multiset(new, old),
        }
    }

    fn correlate<'a>(&self, items: &'a [Value]) -> Option<Vec<Correlated<'a>>> {
        let mut seen = HashSet::with_capacity(items.len());
        let mut out = Vec::with_capacity(items.len());

        for item in items {
            let view = item.as_map()?;
            let id = view.get(&self.identity_field).filter(|v| v.is_truthy())?;
            let key = crate::render::log_safe(id).to_string();
            if !seen.insert(key.clone()) {
                return None;
            }
            out.push(Correlated { key, id, view });
        }

        Some(out)
    }

    fn diff_correlated(&self, new: &[Correlated<'_>], old: &[Correlated<'_>]) -> Diff {
        let old_index: HashMap<&str, &Correlated<'_>> =
            old.iter().map(|c| (c.key.as_str(), c)).collect();
        let new_keys: HashSet<&str> = new.iter().map(|c| c.key.as_str()).collect();

        let mut diff = Diff::new();

        for elem in new {
            match old_index.get(elem.key.as_str()) {
                None => diff.added.push(Change::added(
                    ChangeKey::Id(elem.id.clone()),
                    Value::Map(elem.view.clone()),
                )),
                Some(previous) => {
                    let sub = self.diff_views(elem.view, previous.view);
                    if !sub.is_empty() {
                        diff.updated
                            .push(Update::Nested(sub.for_element(elem.id.clone())));
                    }
                }
            }
        }

        for elem in old {
            if !new_keys.contains(elem.key.as_str()) {
                diff.deleted.push(Change::deleted(
                    ChangeKey::Id(elem.id.clone()),
                    Value::Map(elem.view.clone()),
                ));
            }
        }

        diff
    }
}

/// Multiset difference: each old element absorbs at most one equal new element.
fn diff_multiset(new: &[Value], old: &[Value]) -> Diff {
    let mut matched = vec![false; old.len()];
    let mut diff = Diff::new();

    for item in new {
        let hit = old
            .iter()
            .enumerate()
            .find(|(i, candidate)| !matched[*i] && *candidate == item)
            .map(|(i, _)| i);
        match hit {
            Some(i) => matched[i] = true,
            None => diff
                .added
                .push(Change::added(ChangeKey::Element, item.clone())),
        }
    }

    for (item, was_matched) in old.iter().zip(matched) {
        if !was_matched {
            diff.deleted
                .push(Change::deleted(ChangeKey::Element, item.clone()));
        }
    }

    diff
}
