//! Log-safe rendering.
//!
//! Everything that leaves the tracker towards a change log goes through
//! these functions. Decimals become strings, temporal values become ISO-8601
//! strings and nested structures are rendered recursively. Non-finite floats
//! have no JSON form and render as `null`.

use crate::diff::model::{Change, ChangeKey, Diff, Update};
use crate::model::{CanonicalView, Metadata, Value};
use serde_json::{json, Map, Number};

/// Render a single value.
pub fn log_safe(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Decimal(d) => serde_json::Value::String(d.to_string()),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        Value::Time(t) => serde_json::Value::String(t.format("%H:%M:%S%.f").to_string()),
        Value::Map(view) => serde_json::Value::Object(view_to_log_safe(view)),
        Value::List(items) => serde_json::Value::Array(items.iter().map(log_safe).collect()),
    }
}

/// Render every field of a view.
pub fn view_to_log_safe(view: &CanonicalView) -> Map<String, serde_json::Value> {
    view.iter()
        .map(|(k, v)| (k.clone(), log_safe(v)))
        .collect()
}

/// Render a metadata map.
pub fn metadata_to_log_safe(metadata: &Metadata) -> serde_json::Value {
    serde_json::Value::Object(
        metadata
            .iter()
            .map(|(k, v)| (k.clone(), log_safe(v)))
            .collect(),
    )
}

fn key_to_log_safe(key: &ChangeKey) -> serde_json::Value {
    match key {
        ChangeKey::Field(name) => serde_json::Value::String(name.clone()),
        ChangeKey::Id(id) => log_safe(id),
        ChangeKey::Element => serde_json::Value::Null,
    }
}

fn optional(value: &Option<Value>) -> serde_json::Value {
    value.as_ref().map(log_safe).unwrap_or(serde_json::Value::Null)
}

impl Change {
    /// Log-safe JSON form: `{key, value, old_value[, metadata]}`.
    pub fn to_log_safe(&self) -> serde_json::Value {
        let mut out = json!({
            "key": key_to_log_safe(&self.key),
            "value": optional(&self.value),
            "old_value": optional(&self.old_value),
        });
        if !self.metadata.is_empty() {
            out["metadata"] = metadata_to_log_safe(&self.metadata);
        }
        out
    }
}

impl Diff {
    /// Log-safe JSON form of the whole diff tree.
    ///
    /// `updated` mixes change objects and nested diff objects; nested diffs
    /// are recognisable by their `added`/`deleted`/`updated` arrays.
    pub fn to_log_safe(&self) -> serde_json::Value {
        let mut out = Map::new();
        if let Some(field_name) = &self.field_name {
            out.insert("field_name".to_string(), json!(field_name));
        }
        if let Some(id) = &self.correlation_id {
            out.insert("correlation_id".to_string(), log_safe(id));
        }
        out.insert(
            "added".to_string(),
            self.added.iter().map(Change::to_log_safe).collect(),
        );
        out.insert(
            "deleted".to_string(),
            self.deleted.iter().map(Change::to_log_safe).collect(),
        );
        out.insert(
            "updated".to_string(),
            self.updated
                .iter()
                .map(|u| match u {
                    Update::Field(change) => change.to_log_safe(),
                    Update::Nested(diff) => diff.to_log_safe(),
                })
                .collect(),
        );
        if !self.metadata.is_empty() {
            out.insert(
                "metadata".to_string(),
                metadata_to_log_safe(&self.metadata),
            );
        }
        serde_json::Value::Object(out)
    }
}
