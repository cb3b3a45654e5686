use kronos_core::{
    Attribute, CanonicalView, Entity, KronosError, MemoryChangeLog, MemorySnapshotStore, Metadata,
    Record, Result, Tracker, TrackerConfig, Value,
};
use serde_json::json;
use std::any::Any;

/// The person fixture used across the diff scenarios
#[allow(dead_code)]
pub fn person() -> CanonicalView {
    CanonicalView::from_json(json!({
        "name": "test test",
        "first_name": "test",
        "last_name": "test",
        "age": 30,
        "profession": "programmer",
        "address": {
            "name": "test",
            "address1": "test address1",
            "address2": "test address2",
            "city": "test city",
            "state": "test state",
            "country": "test country",
            "zip": "test zip"
        }
    }))
    .unwrap()
}

/// Build a view from a JSON object literal
#[allow(dead_code)]
pub fn view(json: serde_json::Value) -> CanonicalView {
    CanonicalView::from_json(json).unwrap()
}

/// Build a `User` record from a JSON object literal
#[allow(dead_code)]
pub fn user(json: serde_json::Value) -> Record {
    Record::from_json("User", json).unwrap()
}

/// Replace `field` of the nested map `parent`
#[allow(dead_code)]
pub fn set_nested(view: &mut CanonicalView, parent: &str, field: &str, value: impl Into<Value>) {
    let mut nested = view.get(parent).and_then(Value::as_map).cloned().unwrap();
    nested.insert(field, value);
    view.insert(parent, nested);
}

#[allow(dead_code)]
pub fn no_metadata() -> Metadata {
    Metadata::new()
}

#[allow(dead_code)]
pub fn memory_tracker() -> Tracker<MemorySnapshotStore, MemoryChangeLog> {
    Tracker::in_memory(TrackerConfig::default())
}

/// A domain object converting itself through `to_view`
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: rust_decimal::Decimal,
}

impl Entity for Account {
    fn type_name(&self) -> &str {
        "Account"
    }

    fn entity_id(&self) -> Option<Value> {
        Some(Value::Int(self.id))
    }

    fn to_view(&self) -> Option<CanonicalView> {
        Some(
            CanonicalView::new()
                .with("id", self.id)
                .with("owner", self.owner.as_str())
                .with("balance", self.balance),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A domain object exposing only its attributes, for reflection
#[allow(dead_code)]
pub struct Node {
    pub name: String,
    pub children: Vec<Node>,
}

#[allow(dead_code)]
impl Node {
    pub fn leaf(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    pub fn chain(depth: usize) -> Self {
        let mut node = Node::leaf("leaf");
        for i in 0..depth {
            node = Node {
                name: format!("level-{}", i),
                children: vec![node],
            };
        }
        node
    }
}

impl Entity for Node {
    fn type_name(&self) -> &str {
        "Node"
    }

    fn attributes(&self) -> Option<Vec<(String, Attribute<'_>)>> {
        Some(vec![
            ("name".to_string(), Attribute::value(self.name.as_str())),
            (
                "children".to_string(),
                Attribute::Entities(self.children.iter().map(|c| c as &dyn Entity).collect()),
            ),
        ])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An entity no strategy can normalize
#[allow(dead_code)]
pub struct Opaque;

impl Entity for Opaque {
    fn type_name(&self) -> &str {
        "Opaque"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[allow(dead_code)]
pub fn assert_conflict<T: std::fmt::Debug>(result: Result<T>, expected_key: &str) {
    match result {
        Err(KronosError::Conflict { entity_key }) => assert_eq!(entity_key, expected_key),
        other => panic!("expected conflict on {}, got {:?}", expected_key, other),
    }
}
