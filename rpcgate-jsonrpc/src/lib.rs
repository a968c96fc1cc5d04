//! A JSON-RPC 2.0 request pipeline with schema-validated params.
//!
//! The [`Pipeline`] takes the raw body of a request, checks that it's a well-formed JSON-RPC
//! request, validates its params against the method's schema (filling in declared defaults
//! first), calls the method's handler, and turns whatever happened into a JSON-RPC response.
//! Every failure along the way maps to one of the reserved JSON-RPC error codes, with a
//! field → message map in `data` when a schema rejected the request.
//!
//! This crate doesn't do transport.  Something else receives the request, hands the body to
//! [`Pipeline::serve`] or [`Pipeline::handle`], and sends back the [`Response`].  Batches and
//! notifications aren't supported; every body is a single request and gets a single response.
//!
//! Methods are registered when the pipeline is built and can't be added afterwards:
//!
//! ```no_run
//! use rpcgate_jsonrpc::{HandlerError, JsonValue, Method, Pipeline, RequestContext};
//! use serde_json::json;
//!
//! async fn greet(params: JsonValue, _context: RequestContext) -> Result<String, HandlerError> {
//!     Ok(format!("hello {}", params["name"].as_str().unwrap_or_default()))
//! }
//!
//! # async fn run() -> rpcgate_jsonrpc::Result<()> {
//! let pipeline = Pipeline::builder()
//!     .with_method(Method::new("greet", greet).with_params_schema(json!({
//!         "type": "object",
//!         "properties": { "name": { "type": "string", "default": "world" } }
//!     })))
//!     .build()?;
//!
//! let response = pipeline
//!     .handle(br#"{"jsonrpc":"2.0","method":"greet","id":1}"#, Default::default())
//!     .await;
//! # Ok(())
//! # }
//! ```

/// Re-export the exact async-trait macro we use, for implementing [`MethodHandler`] by hand
#[doc(hidden)]
pub use async_trait::async_trait;

mod config;
mod envelope;
mod error;
mod extensions;
mod fault;
mod handler;
mod pipeline;
mod registry;
#[cfg(test)]
pub mod testing;
mod types;

pub use config::{Mode, PipelineConfig};
pub use envelope::ENVELOPE_SCHEMA_NAME;
pub use error::{HandlerError, JsonRpcError, Result};
pub use extensions::Extensions;
pub use fault::{Fault, FaultReporter, TracingFaultReporter};
pub use handler::{MethodHandler, RequestContext, Typed, typed};
pub use pipeline::{Dispatch, InboundRequest, Pipeline, PipelineBuilder};
pub use registry::{Method, MethodEntry, Registry};
pub use types::{
    ErrorCode, ErrorDetails, ErrorResponse, Id, JsonValue, Request, Response, ResponsePayload, SuccessResponse,
    TwoPointZero,
};
