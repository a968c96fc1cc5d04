//! The registry of named schemas that `$ref` and `allOf` resolve against.
use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::{Result, Schema, SchemaError};

/// Immutable set of named schemas.
///
/// Every reference in every schema of a built set names a schema in the same set, and the
/// composition graph is acyclic.  Those checks run once in [`SchemaSetBuilder::build`], so
/// nothing downstream has to handle dangling references or infinite composition.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: IndexMap<String, Schema>,
}

impl SchemaSet {
    pub fn builder() -> SchemaSetBuilder {
        SchemaSetBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Look up a schema, failing if it's not registered
    pub fn require(&self, name: &str) -> Result<&Schema> {
        self.get(name).ok_or_else(|| SchemaError::UnknownSchema { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SchemaSetBuilder {
    schemas: IndexMap<String, Schema>,
}

impl SchemaSetBuilder {
    /// Deserialize and register a schema document under `name`.
    pub fn register(&mut self, name: impl Into<String>, document: JsonValue) -> Result<&mut Self> {
        let name = name.into();
        let schema = Schema::from_json(name.clone(), document)?;
        self.register_schema(name, schema)
    }

    pub fn register_schema(&mut self, name: impl Into<String>, schema: Schema) -> Result<&mut Self> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::DuplicateSchema { name });
        }

        tracing::trace!(schema = %name, "Registered schema");
        self.schemas.insert(name, schema);
        Ok(self)
    }

    /// Check every reference and the composition graph, and freeze the set.
    pub fn build(self) -> Result<SchemaSet> {
        for (name, schema) in &self.schemas {
            if let Some(reference) = schema
                .all_references()
                .into_iter()
                .find(|reference| !self.schemas.contains_key(*reference))
            {
                return Err(SchemaError::UnknownReference {
                    schema: name.clone(),
                    reference: reference.to_string(),
                });
            }
        }

        {
            let mut acyclic = HashSet::new();
            for name in self.schemas.keys() {
                let mut chain = Vec::new();
                self.check_composition(name, &mut chain, &mut acyclic)?;
            }
        }

        tracing::debug!(schema_count = self.schemas.len(), "Schema set built");

        Ok(SchemaSet { schemas: self.schemas })
    }

    /// Depth-first walk of the composition graph from `name`, failing on the first back edge.
    ///
    /// `chain` is the path of names from the walk's starting point; `acyclic` remembers names
    /// whose entire composition subgraph has already been checked.
    fn check_composition<'a>(
        &'a self,
        name: &'a str,
        chain: &mut Vec<&'a str>,
        acyclic: &mut HashSet<&'a str>,
    ) -> Result<()> {
        if acyclic.contains(name) {
            return Ok(());
        }

        if let Some(start) = chain.iter().position(|visited| *visited == name) {
            let mut cycle: Vec<String> = chain[start..].iter().map(|name| name.to_string()).collect();
            cycle.push(name.to_string());
            return Err(SchemaError::CompositionCycle { chain: cycle });
        }

        // References were checked before the walk started
        let Some(schema) = self.schemas.get(name) else {
            return Ok(());
        };

        chain.push(name);
        for reference in schema.composition_references() {
            self.check_composition(reference, chain, acyclic)?;
        }
        chain.pop();

        acyclic.insert(name);
        Ok(())
    }
}
