//! Resolution of schema composition, so that properties (and in particular their defaults)
//! declared in a base schema are visible on the schemas composed from it.
//!
//! The result is only meant for looking up declared properties.  It drops the composition
//! keywords, so it is not a substitute for the original schema when validating.
use indexmap::IndexMap;

use crate::{Result, Schema, SchemaError, SchemaSet};

/// Resolve `$ref` and `allOf` in `schema` into a single flat `properties` map.
///
/// Composed schemas are merged in declaration order (`$ref` first, then each `allOf` entry), each
/// one resolved recursively first.  The schema's own properties are merged last, so on a name
/// collision the most derived declaration wins.
pub fn resolve_composition(schema: &Schema, schemas: &SchemaSet) -> Result<Schema> {
    let mut chain = Vec::new();
    resolve(schema, schemas, &mut chain)
}

fn resolve(schema: &Schema, schemas: &SchemaSet, chain: &mut Vec<String>) -> Result<Schema> {
    if !schema.is_composed() {
        return Ok(schema.clone());
    }

    let mut properties = IndexMap::new();

    if let Some(reference) = &schema.reference {
        properties.extend(resolve_reference(reference, schemas, chain)?.properties);
    }

    for part in &schema.all_of {
        properties.extend(resolve(part, schemas, chain)?.properties);
    }

    properties.extend(schema.properties.clone());

    Ok(Schema {
        reference: None,
        all_of: Vec::new(),
        properties,
        ..schema.clone()
    })
}

fn resolve_reference(reference: &str, schemas: &SchemaSet, chain: &mut Vec<String>) -> Result<Schema> {
    if chain.iter().any(|name| name == reference) {
        let mut cycle = chain.clone();
        cycle.push(reference.to_string());
        return Err(SchemaError::CompositionCycle { chain: cycle });
    }

    let target = schemas.get(reference).ok_or_else(|| SchemaError::UnknownReference {
        schema: chain.last().cloned().unwrap_or_default(),
        reference: reference.to_string(),
    })?;

    chain.push(reference.to_string());
    let resolved = resolve(target, schemas, chain);
    chain.pop();

    resolved
}

/// Fully composed schemas, computed once and looked up by key afterwards.
#[derive(Debug, Clone, Default)]
pub struct ComposedSchemas {
    by_key: IndexMap<String, Schema>,
}

impl ComposedSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the composition of `schema` and remember it under `key`.
    pub fn insert(&mut self, key: impl Into<String>, schema: &Schema, schemas: &SchemaSet) -> Result<&Schema> {
        let composed = resolve_composition(schema, schemas)?;
        let (index, _) = self.by_key.insert_full(key.into(), composed);
        Ok(&self.by_key[index])
    }

    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
