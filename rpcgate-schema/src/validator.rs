//! Evaluation of JSON values against the schemas of a [`SchemaSet`].
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::format::{DefaultFormatter, MessageFormatter};
use crate::{
    DataPath, ErrorKind, ErrorTarget, JsonType, Result, Schema, SchemaSet, ValidationError,
    ValidationResult,
};

/// Validates values against a fixed set of schemas.
///
/// The schema set and the message formatters are fixed when the validator is constructed, so a
/// validator can be shared freely between concurrent requests.  Cloning is cheap.
#[derive(Clone)]
pub struct SchemaValidator {
    schemas: Arc<SchemaSet>,
    formatters: Arc<[Box<dyn MessageFormatter>]>,
}

impl SchemaValidator {
    /// A validator using only the built-in messages
    pub fn new(schemas: SchemaSet) -> Self {
        Self::with_formatters(schemas, Vec::new())
    }

    /// A validator that consults `formatters` in order before falling back to the built-in
    /// messages.
    pub fn with_formatters(schemas: SchemaSet, formatters: Vec<Box<dyn MessageFormatter>>) -> Self {
        Self {
            schemas: Arc::new(schemas),
            formatters: formatters.into(),
        }
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// Validate `value` against `schema`.
    ///
    /// Any `$ref` in `schema` is resolved against this validator's schema set.  Schemas taken
    /// from the set are guaranteed to resolve; a foreign schema with a dangling reference has
    /// that reference ignored.
    pub fn validate(&self, value: &JsonValue, schema: &Schema) -> ValidationResult {
        let mut errors = Vec::new();
        self.check(value, schema, &DataPath::root(), "#", &mut errors);

        match errors.len() {
            0 => ValidationResult::valid(),
            1 => ValidationResult::invalid(errors.remove(0)),
            count => ValidationResult::invalid(self.violation(
                ErrorKind::Multiple { count },
                ErrorTarget::Value { path: DataPath::root() },
                "#".to_string(),
                errors,
            )),
        }
    }

    /// Validate `value` against the registered schema called `name`.
    pub fn validate_named(&self, value: &JsonValue, name: &str) -> Result<ValidationResult> {
        let schema = self.schemas.require(name)?;
        Ok(self.validate(value, schema))
    }

    fn check(
        &self,
        value: &JsonValue,
        schema: &Schema,
        path: &DataPath,
        schema_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(reference) = &schema.reference {
            match self.schemas.get(reference) {
                Some(target) => self.check(value, target, path, &format!("{reference}#"), errors),
                None => {
                    tracing::error!(%reference, %schema_path, "Ignoring reference to unregistered schema");
                }
            }
        }

        for (index, part) in schema.all_of.iter().enumerate() {
            let part_path = format!("{schema_path}/allOf/{index}");
            let mut part_errors = Vec::new();
            self.check(value, part, path, &part_path, &mut part_errors);

            if !part_errors.is_empty() {
                errors.push(self.violation(
                    ErrorKind::AllOf { index },
                    ErrorTarget::Value { path: path.clone() },
                    part_path,
                    part_errors,
                ));
            }
        }

        if let Some(types) = &schema.types {
            if !types.matches(value) {
                errors.push(self.leaf(
                    ErrorKind::Type {
                        expected: types.types().to_vec(),
                        found: JsonType::of(value),
                    },
                    ErrorTarget::Value { path: path.clone() },
                    format!("{schema_path}/type"),
                ));

                // Nothing else about a value of the wrong type is worth reporting
                return;
            }
        }

        if let Some(allowed) = &schema.enum_values {
            if !allowed.contains(value) {
                errors.push(self.leaf(
                    ErrorKind::Enum {
                        allowed: allowed.clone(),
                    },
                    ErrorTarget::Value { path: path.clone() },
                    format!("{schema_path}/enum"),
                ));
            }
        }

        match value {
            JsonValue::String(string) => self.check_string(string, schema, path, schema_path, errors),
            JsonValue::Number(number) => {
                if let Some(actual) = number.as_f64() {
                    self.check_number(actual, schema, path, schema_path, errors);
                }
            }
            JsonValue::Object(object) => self.check_object(object, schema, path, schema_path, errors),
            JsonValue::Array(elements) => {
                if let Some(items) = &schema.items {
                    let items_path = format!("{schema_path}/items");
                    for (index, element) in elements.iter().enumerate() {
                        self.check(element, items, &path.index(index), &items_path, errors);
                    }
                }
            }
            JsonValue::Null | JsonValue::Bool(_) => {}
        }
    }

    fn check_string(
        &self,
        string: &str,
        schema: &Schema,
        path: &DataPath,
        schema_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        // Lengths are in characters, not bytes
        let actual = string.chars().count() as u64;

        if let Some(limit) = schema.min_length.filter(|limit| actual < *limit) {
            errors.push(self.leaf(
                ErrorKind::MinLength { limit, actual },
                ErrorTarget::Value { path: path.clone() },
                format!("{schema_path}/minLength"),
            ));
        }

        if let Some(limit) = schema.max_length.filter(|limit| actual > *limit) {
            errors.push(self.leaf(
                ErrorKind::MaxLength { limit, actual },
                ErrorTarget::Value { path: path.clone() },
                format!("{schema_path}/maxLength"),
            ));
        }

        if let Some(pattern) = schema.pattern.as_ref().filter(|pattern| !pattern.is_match(string)) {
            errors.push(self.leaf(
                ErrorKind::Pattern {
                    pattern: pattern.as_str().to_string(),
                },
                ErrorTarget::Value { path: path.clone() },
                format!("{schema_path}/pattern"),
            ));
        }
    }

    fn check_number(
        &self,
        actual: f64,
        schema: &Schema,
        path: &DataPath,
        schema_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(limit) = schema.minimum.filter(|limit| actual < *limit) {
            errors.push(self.leaf(
                ErrorKind::Minimum { limit, actual },
                ErrorTarget::Value { path: path.clone() },
                format!("{schema_path}/minimum"),
            ));
        }

        if let Some(limit) = schema.maximum.filter(|limit| actual > *limit) {
            errors.push(self.leaf(
                ErrorKind::Maximum { limit, actual },
                ErrorTarget::Value { path: path.clone() },
                format!("{schema_path}/maximum"),
            ));
        }
    }

    fn check_object(
        &self,
        object: &serde_json::Map<String, JsonValue>,
        schema: &Schema,
        path: &DataPath,
        schema_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        for field in schema.required.iter().filter(|field| !object.contains_key(*field)) {
            errors.push(self.leaf(
                ErrorKind::Required { field: field.clone() },
                ErrorTarget::MissingField {
                    parent: path.clone(),
                    field: field.clone(),
                },
                format!("{schema_path}/required"),
            ));
        }

        for (name, property) in &schema.properties {
            if let Some(property_value) = object.get(name) {
                self.check(
                    property_value,
                    property,
                    &path.key(name),
                    &format!("{schema_path}/properties/{name}"),
                    errors,
                );
            }
        }

        if schema.additional_properties == Some(false) {
            for name in object.keys().filter(|name| !schema.properties.contains_key(*name)) {
                errors.push(self.leaf(
                    ErrorKind::AdditionalProperty { name: name.clone() },
                    ErrorTarget::Value { path: path.key(name) },
                    format!("{schema_path}/additionalProperties"),
                ));
            }
        }
    }

    fn leaf(&self, kind: ErrorKind, target: ErrorTarget, schema_path: String) -> ValidationError {
        self.violation(kind, target, schema_path, Vec::new())
    }

    fn violation(
        &self,
        kind: ErrorKind,
        target: ErrorTarget,
        schema_path: String,
        sub_errors: Vec<ValidationError>,
    ) -> ValidationError {
        let message = self.message(&kind, &target);
        ValidationError {
            message,
            schema_path,
            target,
            kind,
            sub_errors,
        }
    }

    fn message(&self, kind: &ErrorKind, target: &ErrorTarget) -> String {
        self.formatters
            .iter()
            .find_map(|formatter| formatter.format(kind, target).filter(|message| !message.is_empty()))
            .or_else(|| DefaultFormatter.format(kind, target))
            .unwrap_or_default()
    }
}
