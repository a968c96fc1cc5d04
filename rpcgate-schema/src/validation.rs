//! The structured result of validating a value against a schema.
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{DataPath, JsonType};

/// What kind of rule was violated, with the details specific to that rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ErrorKind {
    Type {
        expected: Vec<JsonType>,
        found: JsonType,
    },
    Required {
        field: String,
    },
    MinLength {
        limit: u64,
        actual: u64,
    },
    MaxLength {
        limit: u64,
        actual: u64,
    },
    Pattern {
        pattern: String,
    },
    Enum {
        allowed: Vec<JsonValue>,
    },
    Minimum {
        limit: f64,
        actual: f64,
    },
    Maximum {
        limit: f64,
        actual: f64,
    },
    AdditionalProperty {
        name: String,
    },
    /// Group node: the value failed the `allOf` entry at `index`
    AllOf {
        index: usize,
    },
    /// Group node: more than one violation at the top level of a validation
    Multiple {
        count: usize,
    },
}

impl ErrorKind {
    /// Group nodes summarize their `sub_errors` and never stand for a field on their own.
    pub fn is_group(&self) -> bool {
        matches!(self, ErrorKind::AllOf { .. } | ErrorKind::Multiple { .. })
    }
}

/// Where in the validated value a violation is reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum ErrorTarget {
    /// A required property is absent from the object at `parent`
    MissingField { parent: DataPath, field: String },
    /// The value at `path` itself is wrong
    Value { path: DataPath },
}

impl ErrorTarget {
    /// The caller-facing name of the field this target points at.
    ///
    /// A missing field is addressed by its own name rather than by the path of the object that
    /// lacks it, so a request without `title` is reported under `title`.
    pub fn field_path(&self) -> String {
        match self {
            ErrorTarget::MissingField { field, .. } => field.clone(),
            ErrorTarget::Value { path } => path.to_field_path(),
        }
    }

    /// JSON pointer to the value where the violation was detected
    pub fn data_path(&self) -> &DataPath {
        match self {
            ErrorTarget::MissingField { parent, .. } => parent,
            ErrorTarget::Value { path } => path,
        }
    }
}

/// A node in the validation error tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub message: String,
    /// JSON pointer into the schema to the keyword that failed
    pub schema_path: String,
    pub target: ErrorTarget,
    pub kind: ErrorKind,
    pub sub_errors: Vec<ValidationError>,
}

impl ValidationError {
    pub fn is_leaf(&self) -> bool {
        self.sub_errors.is_empty()
    }

    /// The leaves of the tree rooted here, depth-first, children in declared order.
    ///
    /// Uses an explicit stack so that arbitrarily deep trees are safe to walk.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { pending: vec![self] }
    }
}

pub struct Leaves<'a> {
    pending: Vec<&'a ValidationError>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a ValidationError;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.pending.pop() {
            if node.is_leaf() {
                return Some(node);
            }
            self.pending.extend(node.sub_errors.iter().rev());
        }

        None
    }
}

/// Outcome of a validation.  `error` is present exactly when `valid` is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<ValidationError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { valid: true, error: None }
    }

    pub fn invalid(error: ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    pub fn into_error(self) -> Option<ValidationError> {
        self.error
    }
}
