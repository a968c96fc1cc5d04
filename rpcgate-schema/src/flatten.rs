//! Flattening of validation error trees into a simple field → message map suitable for showing
//! to whoever sent the invalid value.
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::ValidationError;

/// Field path → message.  Keys keep the order in which they were first written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlatErrorMap(IndexMap<String, String>);

impl FlatErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message for `field`, replacing whatever was there before
    pub fn set(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

impl From<FlatErrorMap> for JsonValue {
    fn from(map: FlatErrorMap) -> Self {
        JsonValue::Object(
            map.0
                .into_iter()
                .map(|(field, message)| (field, JsonValue::String(message)))
                .collect(),
        )
    }
}

/// Flatten a validation error tree.
///
/// Folds over the leaves of the tree depth-first, children in declared order.  Each leaf sets
/// its message at its field path, so when two leaves land on the same path the later one wins.
/// Group nodes (`AllOf`, `Multiple`) are skipped on purpose: they never write their own summary
/// message, only their children do.
pub fn flatten(error: &ValidationError) -> FlatErrorMap {
    error.leaves().fold(FlatErrorMap::new(), |mut map, leaf| {
        map.set(leaf.target.field_path(), leaf.message.clone());
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataPath, ErrorKind, ErrorTarget, SchemaSet, SchemaValidator};
    use serde_json::json;

    fn required(parent: DataPath, field: &str, message: &str) -> ValidationError {
        ValidationError {
            message: message.to_string(),
            schema_path: "#/required".to_string(),
            target: ErrorTarget::MissingField {
                parent,
                field: field.to_string(),
            },
            kind: ErrorKind::Required { field: field.to_string() },
            sub_errors: Vec::new(),
        }
    }

    fn value(path: DataPath, message: &str) -> ValidationError {
        ValidationError {
            message: message.to_string(),
            schema_path: "#/type".to_string(),
            target: ErrorTarget::Value { path },
            kind: ErrorKind::Pattern { pattern: ".".into() },
            sub_errors: Vec::new(),
        }
    }

    fn all_of(sub_errors: Vec<ValidationError>) -> ValidationError {
        ValidationError {
            message: "Value does not satisfy allOf schema 0".to_string(),
            schema_path: "#/allOf/0".to_string(),
            target: ErrorTarget::Value { path: DataPath::root() },
            kind: ErrorKind::AllOf { index: 0 },
            sub_errors,
        }
    }

    #[test]
    fn required_is_keyed_by_missing_field() {
        let map = flatten(&required(DataPath::root(), "title", "Missing required property: title"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("title"), Some("Missing required property: title"));
        assert_eq!(map.get(""), None);
    }

    #[test]
    fn nested_required_uses_field_name_only() {
        let map = flatten(&required(DataPath::root().key("address"), "city", "missing"));
        assert_eq!(map.get("city"), Some("missing"));
    }

    #[test]
    fn value_errors_use_data_path() {
        let map = flatten(&value(DataPath::root().key("items").index(2).key("name"), "bad"));
        assert_eq!(map.get("items[2].name"), Some("bad"));
    }

    #[test]
    fn root_value_error_keyed_by_empty_string() {
        let map = flatten(&value(DataPath::root(), "Expected type object but found type array"));
        assert_eq!(map.get(""), Some("Expected type object but found type array"));
    }

    #[test]
    fn last_leaf_wins_on_collision() {
        let tree = all_of(vec![
            value(DataPath::root().key("name"), "first"),
            all_of(vec![value(DataPath::root().key("other"), "other"), all_of(vec![value(DataPath::root().key("name"), "second")])]),
        ]);

        let map = flatten(&tree);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("name"), Some("second"));
        // Position is that of the first write
        assert_eq!(map.iter().map(|(field, _)| field).collect::<Vec<_>>(), vec!["name", "other"]);
    }

    #[test]
    fn group_nodes_are_skipped() {
        let map = flatten(&all_of(vec![value(DataPath::root().key("title"), "too short")]));
        assert_eq!(map.get(""), None);
        assert_eq!(map.get("title"), Some("too short"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn deep_tree_does_not_overflow() {
        let mut tree = value(DataPath::root().key("deep"), "bottom");
        for _ in 0..100_000 {
            tree = all_of(vec![tree]);
        }

        let map = flatten(&tree);
        assert_eq!(map.get("deep"), Some("bottom"));

        // Dropping a tree this deep recursively would overflow the stack too
        let mut pending = vec![tree];
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.sub_errors);
        }
    }

    #[test]
    fn serializes_as_object() {
        let mut map = FlatErrorMap::new();
        map.set("b", "1");
        map.set("a", "2");
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"b":"1","a":"2"}"#);
        assert_eq!(JsonValue::from(map), json!({ "b": "1", "a": "2" }));
    }

    #[test]
    fn flattens_real_validation() {
        let mut builder = SchemaSet::builder();
        builder
            .register(
                "base",
                json!({ "type": "object", "required": ["title"], "properties": { "title": { "type": "string" } } }),
            )
            .unwrap()
            .register(
                "post",
                json!({
                    "allOf": [{ "$ref": "base" }],
                    "properties": { "tags": { "type": "array", "items": { "type": "string" } } }
                }),
            )
            .unwrap();
        let validator = SchemaValidator::new(builder.build().unwrap());

        let error = validator
            .validate_named(&json!({ "tags": ["ok", 3] }), "post")
            .unwrap()
            .into_error()
            .unwrap();

        let map = flatten(&error);
        assert_eq!(
            JsonValue::from(map),
            json!({
                "title": "Missing required property: title",
                "tags[1]": "Expected type string but found type integer"
            })
        );
    }
}
