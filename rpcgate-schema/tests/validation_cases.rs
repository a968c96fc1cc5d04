//! Table-driven validation tests.  Schemas and cases live in `testdata/validation_cases.yaml`;
//! each case validates a value and compares the flattened errors with what's expected.

use std::path::Path;

use indexmap::IndexMap;
use rpcgate_schema::{SchemaSet, SchemaValidator, flatten, inject_defaults, resolve_composition};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

#[derive(Debug, Deserialize)]
struct TestData {
    schemas: IndexMap<String, JsonValue>,
    cases: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
struct TestCase {
    description: String,
    schema: String,
    value: JsonValue,
    errors: IndexMap<String, String>,
}

fn load_test_data() -> TestData {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata/validation_cases.yaml");
    let yaml = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_yaml::from_str(&yaml).unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

fn build_validator(data: &TestData) -> SchemaValidator {
    let mut builder = SchemaSet::builder();
    for (name, document) in &data.schemas {
        builder.register(name.clone(), document.clone()).unwrap();
    }
    SchemaValidator::new(builder.build().unwrap())
}

#[test]
fn validation_cases() {
    let data = load_test_data();
    let validator = build_validator(&data);

    for case in &data.cases {
        let result = validator.validate_named(&case.value, &case.schema).unwrap();
        let actual: IndexMap<String, String> = match result.into_error() {
            Some(error) => flatten(&error).iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            None => IndexMap::new(),
        };

        // Compare as sorted pairs; ordering is covered by the unit tests
        let mut actual: Vec<_> = actual.into_iter().collect();
        let mut expected: Vec<_> = case.errors.clone().into_iter().collect();
        actual.sort();
        expected.sort();
        assert_eq!(actual, expected, "case: {}", case.description);
    }
}

#[test]
fn defaults_from_composed_schema() {
    let data = load_test_data();
    let validator = build_validator(&data);
    let schemas = validator.schemas();

    let composed = resolve_composition(schemas.get("post").unwrap(), schemas).unwrap();
    let mut params = json!({ "title": "Hello" });
    assert_eq!(inject_defaults(&mut params, &composed), 1);
    assert_eq!(params, json!({ "title": "Hello", "rating": 3 }));

    let result = validator.validate_named(&params, "post").unwrap();
    assert!(result.valid);
}
