//! Schema-validated JSON-RPC 2.0 request handling.
//!
//! This crate just re-exports the crates that do the work, each behind a cargo feature:
//!
//! - `schema`: [`rpcgate_schema`], schema registration, validation, error flattening, and
//!   default injection, as [`schema`].
//! - `jsonrpc`: [`rpcgate_jsonrpc`], the request pipeline, as [`jsonrpc`].  Implies `schema`.
//!
//! Both are enabled by default.

#[cfg(feature = "jsonrpc")]
pub use rpcgate_jsonrpc as jsonrpc;
#[cfg(feature = "schema")]
pub use rpcgate_schema as schema;

#[cfg(feature = "jsonrpc")]
pub use rpcgate_jsonrpc::{
    ErrorDetails, Extensions, HandlerError, Method, MethodHandler, Pipeline, PipelineConfig, RequestContext,
    Response, typed,
};
