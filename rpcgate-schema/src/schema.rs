//! Rust struct definitions that deserialize from the JSON-Schema-like documents used to describe
//! request envelopes and method parameters.
//!
//! Only the keywords this crate actually evaluates are modeled.  Anything else in a schema
//! document (`title`, `description`, `$schema`, `format`, ...) is accepted and ignored, so
//! documents written for richer validators can still be registered here.
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::{Result, SchemaError};

/// The primitive type names of the `type` keyword.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JsonType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl JsonType {
    /// The most specific type name for a JSON value.
    ///
    /// Numbers without a fractional part are reported as `integer`.
    pub fn of(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(_) => Self::Boolean,
            JsonValue::Object(_) => Self::Object,
            JsonValue::Array(_) => Self::Array,
            JsonValue::String(_) => Self::String,
            JsonValue::Number(number) => {
                if number.is_i64() || number.is_u64() || number.as_f64().is_some_and(|f| f.fract() == 0.0) {
                    Self::Integer
                } else {
                    Self::Number
                }
            }
        }
    }

    /// Whether `value` is an instance of this type.  Every integer is also a `number`.
    pub fn matches(&self, value: &JsonValue) -> bool {
        let actual = Self::of(value);
        actual == *self || (*self == Self::Number && actual == Self::Integer)
    }
}

/// The `type` keyword, which may name a single type or a list of acceptable types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl TypeSet {
    pub fn types(&self) -> &[JsonType] {
        match self {
            TypeSet::Single(single) => std::slice::from_ref(single),
            TypeSet::Multiple(multiple) => multiple,
        }
    }

    pub fn matches(&self, value: &JsonValue) -> bool {
        self.types().iter().any(|ty| ty.matches(value))
    }
}

/// A `pattern` regular expression, compiled when the schema is deserialized.
///
/// As in JSON Schema the pattern is not implicitly anchored.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Regex::new(&pattern).map(Pattern).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A schema document, or any subschema nested inside one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name of another registered schema this value must also satisfy.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeSet>,

    /// Declared properties, in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,

    /// The composition keyword.  Entries are usually `{"$ref": "<name>"}` but inline schemas are
    /// allowed too.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
}

impl Schema {
    /// Deserialize a schema document.  `name` is only used for error reporting.
    pub fn from_json(name: impl Into<String>, document: JsonValue) -> Result<Self> {
        serde_json::from_value(document).map_err(|source| SchemaError::InvalidSchema {
            source,
            name: name.into(),
        })
    }

    /// Whether this schema pulls in any other schema at the same level of the value, either
    /// directly with `$ref` or through `allOf`.
    pub fn is_composed(&self) -> bool {
        self.reference.is_some() || !self.all_of.is_empty()
    }

    /// Every `$ref` anywhere in this schema, including inside nested subschemas.
    pub(crate) fn all_references(&self) -> Vec<&str> {
        let mut references = Vec::new();
        let mut pending = vec![self];

        while let Some(schema) = pending.pop() {
            references.extend(schema.reference.as_deref());
            pending.extend(schema.all_of.iter());
            pending.extend(schema.properties.values());
            pending.extend(schema.items.as_deref());
        }

        references
    }

    /// The `$ref`s reachable without descending into `properties` or `items`.
    ///
    /// These are the edges of the composition graph, which must be acyclic.  References that
    /// sit below a property or array element may legitimately recurse, since each step consumes
    /// part of the (finite) value being validated.
    pub(crate) fn composition_references(&self) -> Vec<&str> {
        let mut references = Vec::new();
        let mut pending = vec![self];

        while let Some(schema) = pending.pop() {
            references.extend(schema.reference.as_deref());
            pending.extend(schema.all_of.iter().rev());
        }

        references
    }
}
