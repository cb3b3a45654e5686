#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{no_metadata, person, set_nested, view};
use kronos_core::diff::engine::DiffEngine;
use kronos_core::{Change, ChangeKey, Update, Value};
use serde_json::json;

fn engine() -> DiffEngine {
    DiffEngine::default()
}

#[test]
fn test_new_fields() {
    let old = person();
    let mut new = person();
    new.insert("favourite color", "black");

    let diff = engine().diff(&new, &old, &no_metadata());

    assert!(!diff.is_empty());
    assert!(diff.deleted.is_empty());
    assert!(diff.updated.is_empty());
    assert_eq!(
        diff.added,
        vec![Change::added("favourite color".into(), Value::from("black"))]
    );
}

#[test]
fn test_deleted_fields() {
    let old = person();
    let mut new = person();
    new.remove("age");

    let diff = engine().diff(&new, &old, &no_metadata());

    assert!(diff.added.is_empty());
    assert!(diff.updated.is_empty());
    assert_eq!(diff.deleted, vec![Change::deleted("age".into(), Value::Int(30))]);
}

#[test]
fn test_updated_fields() {
    let old = person();
    let mut new = person();
    new.insert("age", 40);
    new.insert("first_name", "new name");

    let diff = engine().diff(&new, &old, &no_metadata());

    assert!(diff.added.is_empty());
    assert!(diff.deleted.is_empty());
    assert_eq!(diff.updated.len(), 2);

    let age = diff.updated_field("age").unwrap();
    assert_eq!(age.value, Some(Value::Int(40)));
    assert_eq!(age.old_value, Some(Value::Int(30)));

    let first_name = diff.updated_field("first_name").unwrap();
    assert_eq!(first_name.value, Some(Value::from("new name")));
    assert_eq!(first_name.old_value, Some(Value::from("test")));
}

#[test]
fn test_updates_follow_canonical_key_order() {
    let old = person();
    let mut new = person();
    new.insert("profession", "teacher");
    new.insert("age", 40);

    let diff = engine().diff(&new, &old, &no_metadata());
    let keys: Vec<_> = diff
        .updated
        .iter()
        .filter_map(Update::as_change)
        .filter_map(|c| c.key.field_name())
        .collect();
    assert_eq!(keys, vec!["age", "profession"]);
}

#[test]
fn test_new_fields_in_embedded_entity() {
    let old = person();
    let mut new = person();
    set_nested(&mut new, "address", "new_field", "test");

    let diff = engine().diff(&new, &old, &no_metadata());

    assert!(diff.added.is_empty());
    assert!(diff.deleted.is_empty());
    assert_eq!(diff.updated.len(), 1);

    let address = diff.nested("address").unwrap();
    assert_eq!(address.field_name.as_deref(), Some("address"));
    assert_eq!(
        address.added,
        vec![Change::added("new_field".into(), Value::from("test"))]
    );
    assert!(address.deleted.is_empty());
    assert!(address.updated.is_empty());
}

#[test]
fn test_deleted_fields_in_embedded_entity() {
    let old = person();
    let mut new = person();
    let mut address = new.get("address").and_then(Value::as_map).cloned().unwrap();
    address.remove("address2");
    new.insert("address", address);

    let diff = engine().diff(&new, &old, &no_metadata());

    let address = diff.nested("address").unwrap();
    assert!(address.added.is_empty());
    assert!(address.updated.is_empty());
    assert_eq!(
        address.deleted,
        vec![Change::deleted("address2".into(), Value::from("test address2"))]
    );
}

#[test]
fn test_updated_fields_in_embedded_entity() {
    let old = person();
    let mut new = person();
    set_nested(&mut new, "address", "address2", "new value");

    let diff = engine().diff(&new, &old, &no_metadata());

    let address = diff.nested("address").unwrap();
    assert!(address.added.is_empty());
    assert!(address.deleted.is_empty());
    assert_eq!(
        address.updated,
        vec![Update::Field(Change::updated(
            "address2".into(),
            Value::from("new value"),
            Value::from("test address2"),
        ))]
    );
}

#[test]
fn test_new_elements_in_list_field() {
    let old = view(json!({"tags": ["tag1"]}));
    let new = view(json!({"tags": ["tag1", "tag2"]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    assert!(diff.added.is_empty());
    assert!(diff.deleted.is_empty());
    let tags = diff.nested("tags").unwrap();
    assert_eq!(
        tags.added,
        vec![Change::added(ChangeKey::Element, Value::from("tag2"))]
    );
    assert!(tags.deleted.is_empty());
}

#[test]
fn test_deleted_elements_in_list_field() {
    let old = view(json!({"tags": ["tag1", "tag2"]}));
    let new = view(json!({"tags": ["tag1"]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    let tags = diff.nested("tags").unwrap();
    assert!(tags.added.is_empty());
    assert_eq!(
        tags.deleted,
        vec![Change::deleted(ChangeKey::Element, Value::from("tag2"))]
    );
}

#[test]
fn test_updated_entity_in_list_field() {
    let old = view(json!({"related": [{"id": 1, "name": "test", "value": "test"}]}));
    let new = view(json!({"related": [{"id": 1, "name": "test", "value": "new value"}]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    let related = diff.nested("related").unwrap();
    assert!(related.added.is_empty());
    assert!(related.deleted.is_empty());
    assert_eq!(related.updated.len(), 1);

    let element = related.updated[0].as_diff().unwrap();
    assert_eq!(element.correlation_id, Some(Value::Int(1)));
    assert_eq!(
        element.updated,
        vec![Update::Field(Change::updated(
            "value".into(),
            Value::from("new value"),
            Value::from("test"),
        ))]
    );
}

#[test]
fn test_added_entity_in_list_field() {
    let old = view(json!({"related": [{"id": 1, "name": "test"}]}));
    let new = view(json!({"related": [{"id": 1, "name": "test"}, {"id": 2, "name": "test2"}]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    let related = diff.nested("related").unwrap();
    assert!(related.updated.is_empty());
    assert!(related.deleted.is_empty());
    assert_eq!(
        related.added,
        vec![Change::added(
            ChangeKey::Id(Value::Int(2)),
            Value::Map(view(json!({"id": 2, "name": "test2"}))),
        )]
    );
}

#[test]
fn test_deleted_entity_in_list_field() {
    let old = view(json!({"related": [{"id": 1, "name": "test"}, {"id": 2, "name": "test2"}]}));
    let new = view(json!({"related": [{"id": 1, "name": "test"}]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    let related = diff.nested("related").unwrap();
    assert!(related.updated.is_empty());
    assert!(related.added.is_empty());
    assert_eq!(
        related.deleted,
        vec![Change::deleted(
            ChangeKey::Id(Value::Int(2)),
            Value::Map(view(json!({"id": 2, "name": "test2"}))),
        )]
    );
}

#[test]
fn test_age_update_scenario() {
    let old = view(json!({"name": "A", "age": 30}));
    let new = view(json!({"name": "A", "age": 31}));

    let diff = engine().diff(&new, &old, &no_metadata());

    assert!(diff.added.is_empty());
    assert!(diff.deleted.is_empty());
    assert_eq!(
        diff.updated,
        vec![Update::Field(Change::updated(
            "age".into(),
            Value::Int(31),
            Value::Int(30),
        ))]
    );
}

#[test]
fn test_tags_correlation_scenario() {
    let old = view(json!({"tags": [{"id": 1, "v": "a"}]}));
    let new = view(json!({"tags": [{"id": 1, "v": "b"}, {"id": 2, "v": "c"}]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    let tags = diff.nested("tags").unwrap();
    assert_eq!(tags.field_name.as_deref(), Some("tags"));
    assert!(tags.deleted.is_empty());
    assert_eq!(
        tags.added,
        vec![Change::added(
            ChangeKey::Id(Value::Int(2)),
            Value::Map(view(json!({"id": 2, "v": "c"}))),
        )]
    );
    assert_eq!(tags.updated.len(), 1);
    let element = tags.updated[0].as_diff().unwrap();
    assert_eq!(element.correlation_id, Some(Value::Int(1)));
    assert_eq!(
        element.updated_field("v").unwrap(),
        &Change::updated("v".into(), Value::from("b"), Value::from("a"))
    );
}

#[test]
fn test_unchanged_ids_contribute_nothing() {
    let old = view(json!({"items": [{"id": 1, "v": 1}, {"id": 2, "v": 2}, {"id": 3, "v": 3}]}));
    let new = view(json!({"items": [{"id": 3, "v": 3}, {"id": 1, "v": 9}, {"id": 2, "v": 2}]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    let items = diff.nested("items").unwrap();
    assert!(items.added.is_empty());
    assert!(items.deleted.is_empty());
    assert_eq!(items.updated.len(), 1);
    assert_eq!(
        items.updated[0].as_diff().unwrap().correlation_id,
        Some(Value::Int(1))
    );
}

#[test]
fn test_element_without_id_falls_back_to_scalar_mode() {
    let old = view(json!({"items": [{"id": 1, "v": "a"}]}));
    let new = view(json!({"items": [{"id": 1, "v": "a"}, {"v": "orphan"}]}));

    let diff = engine().diff(&new, &old, &no_metadata());

    let items = diff.nested("items").unwrap();
    assert_eq!(
        items.added,
        vec![Change::added(
            ChangeKey::Element,
            Value::Map(view(json!({"v": "orphan"}))),
        )]
    );
    assert!(items.updated.is_empty());
}

#[test]
fn test_scalar_list_is_a_multiset() {
    let old = view(json!({"tags": ["a", "b"]}));
    let new = view(json!({"tags": ["a", "a", "b"]}));

    let diff = engine().diff(&new, &old, &no_metadata());
    let tags = diff.nested("tags").unwrap();
    assert_eq!(tags.added, vec![Change::added(ChangeKey::Element, Value::from("a"))]);
    assert!(tags.deleted.is_empty());

    let reverse = engine().diff(&old, &new, &no_metadata());
    let tags = reverse.nested("tags").unwrap();
    assert_eq!(tags.deleted, vec![Change::deleted(ChangeKey::Element, Value::from("a"))]);
}

#[test]
fn test_empty_lists_are_equal() {
    let a = view(json!({"tags": []}));
    assert!(engine().diff(&a, &a.clone(), &no_metadata()).is_empty());
}

#[test]
fn test_list_replaced_by_scalar() {
    let old = view(json!({"tags": ["a"]}));
    let new = view(json!({"tags": "a"}));

    let diff = engine().diff(&new, &old, &no_metadata());
    let change = diff.updated_field("tags").unwrap();
    assert_eq!(change.old_value, Some(Value::List(vec![Value::from("a")])));
}

#[test]
fn test_int_and_float_are_distinct() {
    let old = view(json!({"n": 1}));
    let new = view(json!({"n": 1.0}));
    assert!(!engine().diff(&new, &old, &no_metadata()).is_empty());
}

#[test]
fn test_non_finite_floats_equal_themselves() {
    let mut a = view(json!({"name": "m"}));
    a.insert("x", f64::NAN);
    a.insert("y", f64::INFINITY);
    a.insert("samples", Value::List(vec![Value::Float(f64::NAN), Value::Float(1.5)]));

    assert!(engine().diff(&a, &a.clone(), &no_metadata()).is_empty());

    let mut b = a.clone();
    b.insert("y", f64::NEG_INFINITY);
    let diff = engine().diff(&b, &a, &no_metadata());
    let change = diff.updated_field("y").unwrap();
    assert_eq!(change.value, Some(Value::Float(f64::NEG_INFINITY)));
    assert_eq!(change.old_value, Some(Value::Float(f64::INFINITY)));
}

mod properties {
    use super::*;
    use kronos_core::CanonicalView;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-5i64..5).prop_map(Value::Int),
            prop_oneof![Just(f64::NAN), Just(f64::INFINITY), -2.0f64..2.0].prop_map(Value::Float),
            "[a-c]{0,2}".prop_map(Value::Str),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map("[a-d]", inner, 0..4)
                    .prop_map(|m| Value::Map(CanonicalView::from(m))),
            ]
        })
    }

    fn canonical_view() -> impl Strategy<Value = CanonicalView> {
        prop::collection::btree_map("[a-e]", value(), 0..5).prop_map(CanonicalView::from)
    }

    /// Lists reached through map fields compare as multisets of exactly
    /// compared elements, so equality is taken modulo their order.
    fn order_free(value: &Value) -> Value {
        match value {
            Value::List(items) => {
                let mut items = items.clone();
                items.sort_by_cached_key(|v| serde_json::to_string(v).unwrap());
                Value::List(items)
            }
            Value::Map(view) => Value::Map(
                view.iter()
                    .map(|(k, v)| (k.clone(), order_free(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn equivalent(a: &CanonicalView, b: &CanonicalView) -> bool {
        order_free(&Value::Map(a.clone())) == order_free(&Value::Map(b.clone()))
    }

    proptest! {
        #[test]
        fn diff_with_itself_is_empty(a in canonical_view()) {
            prop_assert!(engine().diff(&a, &a, &no_metadata()).is_empty());
        }

        #[test]
        fn empty_iff_equivalent(a in canonical_view(), b in canonical_view()) {
            let diff = engine().diff(&a, &b, &no_metadata());
            prop_assert_eq!(diff.is_empty(), equivalent(&a, &b));
        }

        #[test]
        fn shuffled_lists_are_unchanged(items in prop::collection::vec(value(), 0..6)) {
            let mut reversed = items.clone();
            reversed.reverse();
            let a = CanonicalView::new().with("items", Value::List(items));
            let b = CanonicalView::new().with("items", Value::List(reversed));
            prop_assert!(engine().diff(&a, &b, &no_metadata()).is_empty());
        }

        #[test]
        fn key_coverage(a in canonical_view(), b in canonical_view()) {
            let diff = engine().diff(&a, &b, &no_metadata());

            let added: Vec<&str> = diff.added.iter().filter_map(|c| c.key.field_name()).collect();
            let deleted: Vec<&str> = diff.deleted.iter().filter_map(|c| c.key.field_name()).collect();

            for key in a.keys() {
                prop_assert_eq!(added.contains(&key.as_str()), !b.contains_key(key));
            }
            for key in b.keys() {
                prop_assert_eq!(deleted.contains(&key.as_str()), !a.contains_key(key));
            }
        }
    }
}
