//! Schema support for the `rpcgate` JSON-RPC pipeline.
//!
//! This is not a general-purpose JSON Schema implementation.  It covers the subset
//! of keywords that request envelopes and method parameter schemas actually use, and it produces
//! results shaped for what the pipeline needs to do with them:
//!
//! - [`SchemaValidator`] evaluates a value against a schema and returns a tree of
//!   [`ValidationError`]s that says exactly which rule failed and where.
//! - [`flatten`] turns that tree into a [`FlatErrorMap`] of field → message, which is what gets
//!   sent back to a caller whose request was invalid.
//! - [`resolve_composition`] merges the properties of schemas composed with `$ref`/`allOf`, and
//!   [`inject_defaults`] uses the result to fill in default parameter values.
//!
//! Schemas are registered once, up front, into a [`SchemaSet`].  Building the set checks that
//! every reference resolves and that composition doesn't loop, so none of those problems can
//! surface while a request is being processed.

mod compose;
mod defaults;
mod error;
mod flatten;
pub mod format;
mod path;
mod schema;
mod set;
mod validation;
mod validator;

pub use compose::{ComposedSchemas, resolve_composition};
pub use defaults::inject_defaults;
pub use error::{Result, SchemaError};
pub use flatten::{FlatErrorMap, flatten};
pub use format::{DefaultFormatter, MessageFormatter};
pub use path::{DataPath, PathSegment};
pub use schema::{JsonType, Pattern, Schema, TypeSet};
pub use set::{SchemaSet, SchemaSetBuilder};
pub use validation::{ErrorKind, ErrorTarget, Leaves, ValidationError, ValidationResult};
pub use validator::SchemaValidator;
