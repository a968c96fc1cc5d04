//! The set of methods a pipeline can dispatch to.
//!
//! Methods are registered up front with [`Method`].  When the pipeline is built, each method's
//! params schema joins the shared schema set, and the composition of every schema used for
//! default injection is resolved once and cached here.  After that the [`Registry`] never
//! changes, so requests can read it concurrently without any locking.
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use rpcgate_schema::{ComposedSchemas, Schema, SchemaSet, SchemaSetBuilder};

use crate::types::JsonValue;
use crate::{JsonRpcError, MethodHandler, Result};

/// Name under which a method's params schema is registered in the schema set
pub(crate) fn params_schema_name(method: &str) -> String {
    format!("rpcgate:params:{method}")
}

/// A method registration: name, handler, and optionally a params schema.
pub struct Method {
    name: String,
    handler: Arc<dyn MethodHandler>,
    params_schema: Option<JsonValue>,
    skip_defaulting: bool,
}

impl Method {
    pub fn new(name: impl Into<String>, handler: impl MethodHandler) -> Self {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
            params_schema: None,
            skip_defaulting: false,
        }
    }

    /// Validate the method's params against this schema before the handler is called, and fill
    /// in any defaults it declares.
    ///
    /// The schema can `$ref` any schema registered with the pipeline.  Without a params schema,
    /// params are neither validated nor defaulted.
    pub fn with_params_schema(mut self, schema: JsonValue) -> Self {
        self.params_schema = Some(schema);
        self
    }

    /// Don't fill in default values for this method's params; validation still happens.
    pub fn skip_defaulting(mut self) -> Self {
        self.skip_defaulting = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("params_schema", &self.params_schema)
            .field("skip_defaulting", &self.skip_defaulting)
            .finish_non_exhaustive()
    }
}

/// A registered method, ready for dispatch
pub struct MethodEntry {
    handler: Arc<dyn MethodHandler>,
    params_schema: Option<Schema>,
    skip_defaulting: bool,
}

impl MethodEntry {
    pub fn handler(&self) -> &Arc<dyn MethodHandler> {
        &self.handler
    }

    /// The schema params are validated against, as written
    pub fn params_schema(&self) -> Option<&Schema> {
        self.params_schema.as_ref()
    }

    pub fn skips_defaulting(&self) -> bool {
        self.skip_defaulting
    }
}

/// Method name → registered method.
pub struct Registry {
    methods: HashMap<String, MethodEntry>,
    composed: ComposedSchemas,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Add the params schemas of `methods` to the schema set being built.
    ///
    /// This is where duplicate method names are caught, since the schema set would otherwise
    /// report them as a duplicate schema.
    pub(crate) fn register_schemas(methods: &[Method], schemas: &mut SchemaSetBuilder) -> Result<()> {
        let mut seen = HashSet::with_capacity(methods.len());

        for method in methods {
            if !seen.insert(method.name.as_str()) {
                return Err(JsonRpcError::DuplicateMethod {
                    method: method.name.clone(),
                });
            }

            if let Some(document) = &method.params_schema {
                schemas
                    .register(params_schema_name(&method.name), document.clone())
                    .map_err(|source| JsonRpcError::MethodSchema {
                        method: method.name.clone(),
                        source,
                    })?;
            }
        }

        Ok(())
    }

    /// Build the registry once the schema set containing the methods' params schemas is built.
    pub(crate) fn new(methods: Vec<Method>, schemas: &SchemaSet) -> Result<Self> {
        let mut composed = ComposedSchemas::new();
        let mut entries = HashMap::with_capacity(methods.len());

        for method in methods {
            let params_schema = if method.params_schema.is_some() {
                Some(schemas.require(&params_schema_name(&method.name))?.clone())
            } else {
                None
            };

            if let Some(schema) = &params_schema {
                if !method.skip_defaulting {
                    let resolved = composed.insert(method.name.clone(), schema, schemas).map_err(|source| {
                        JsonRpcError::MethodSchema {
                            method: method.name.clone(),
                            source,
                        }
                    })?;
                    tracing::trace!(
                        method = %method.name,
                        properties = resolved.properties.len(),
                        "Composed params schema"
                    );
                }
            }

            entries.insert(
                method.name,
                MethodEntry {
                    handler: method.handler,
                    params_schema,
                    skip_defaulting: method.skip_defaulting,
                },
            );
        }

        Ok(Self {
            methods: entries,
            composed,
        })
    }

    pub fn get(&self, method: &str) -> Option<&MethodEntry> {
        self.methods.get(method)
    }

    /// The method's params schema with its composition resolved, which is where defaults are
    /// looked up.
    ///
    /// `None` when the method doesn't exist, has no params schema, or skips defaulting.
    pub fn defaults_schema(&self, method: &str) -> Option<&Schema> {
        self.composed.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
