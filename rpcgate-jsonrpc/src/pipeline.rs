//! The request pipeline: everything between receiving the raw bytes of a request body and having
//! a response to send back.
//!
//! Each request goes through the following steps, any of which may end it early with an error
//! response:
//!
//! 1. The body is parsed as JSON (`-32700` if it isn't).
//! 2. The parsed value is validated against the envelope schema (`-32600` if it doesn't match).
//! 3. The method is looked up in the registry (`-32601` if there's no such method).
//! 4. Defaults declared by the method's params schema are filled in.
//! 5. The params are validated against the method's params schema (`-32602` if they don't match).
//! 6. The handler is invoked.  Application errors it raises are passed back as-is; anything else
//!    becomes `-32603`.
//!
//! Every response carries the request's `id` if it could be read, and `null` otherwise.
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rpcgate_schema::{MessageFormatter, Schema, SchemaSet, SchemaValidator, flatten, inject_defaults};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::Instrument;
use uuid::Uuid;

use crate::envelope::{ENVELOPE_SCHEMA_NAME, envelope_schema};
use crate::error::panic_message;
use crate::types::{ErrorDetails, Id, JsonValue, Request, Response};
use crate::{
    Extensions, Fault, FaultReporter, HandlerError, Method, MethodHandler, PipelineConfig, Registry, RequestContext,
    Result, TracingFaultReporter,
};

/// A request as it arrives from the transport.
///
/// Only the content type and the body matter to the pipeline.  Anything else the transport knows
/// about the request that handlers might need goes in `extensions`.
#[derive(Debug)]
pub struct InboundRequest<B> {
    pub content_type: Option<String>,
    pub body: B,
    pub extensions: Extensions,
}

impl<B> InboundRequest<B> {
    pub fn new(content_type: Option<&str>, body: B) -> Self {
        Self {
            content_type: content_type.map(ToString::to_string),
            body,
            extensions: Extensions::new(),
        }
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }
}

/// What [`Pipeline::serve`] did with a request
#[derive(Debug)]
pub enum Dispatch<B> {
    /// This was a JSON-RPC request, and this is the response to send back.
    Handled(Response),
    /// Not a JSON-RPC request.  It's returned untouched so something else can handle it.
    PassThrough(InboundRequest<B>),
}

/// Validates and dispatches JSON-RPC requests.
///
/// Cloning is cheap; all clones share the same registry and schemas, none of which change once
/// the pipeline is built.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

struct PipelineInner {
    config: PipelineConfig,
    validator: SchemaValidator,
    envelope: Schema,
    registry: Registry,
    fault_reporter: Arc<dyn FaultReporter>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.inner.validator
    }

    /// Whether a request with this content type is one for the pipeline.
    ///
    /// Only the media type is compared, case-insensitively; parameters like `charset` are ignored.
    pub fn accepts(&self, content_type: &str) -> bool {
        media_type(content_type).eq_ignore_ascii_case(media_type(&self.inner.config.content_type))
    }

    /// Handle the request if it's a JSON-RPC request, otherwise hand it back.
    pub async fn serve<B>(&self, mut request: InboundRequest<B>) -> Dispatch<B>
    where
        B: AsyncRead + Unpin,
    {
        if !request.content_type.as_deref().is_some_and(|content_type| self.accepts(content_type)) {
            tracing::trace!(content_type = ?request.content_type, "Passing through non-RPC request");
            return Dispatch::PassThrough(request);
        }

        let mut body = Vec::new();
        if let Err(e) = request.body.read_to_end(&mut body).await {
            tracing::debug!(error = %e, "Failed to read request body");
            return Dispatch::Handled(Response::error(
                Id::Null,
                ErrorDetails::parse_error(JsonValue::String(e.to_string())),
            ));
        }

        Dispatch::Handled(self.handle(&body, request.extensions).await)
    }

    /// Process one request body and produce the response.
    ///
    /// This never fails; every problem with the request becomes an error response.
    pub async fn handle(&self, body: &[u8], extensions: Extensions) -> Response {
        let request_id = Uuid::now_v7();
        let span = tracing::debug_span!("rpc_request", %request_id, method = tracing::field::Empty);

        self.process(body, request_id, extensions).instrument(span).await
    }

    async fn process(&self, body: &[u8], request_id: Uuid, extensions: Extensions) -> Response {
        let value: JsonValue = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, body_len = body.len(), "Request body is not valid JSON");
                return Response::error(Id::Null, ErrorDetails::parse_error(JsonValue::String(e.to_string())));
            }
        };

        // Recovered before validation so that even an invalid request gets its id back
        let id = Id::recover(&value);

        if let Some(error) = self.inner.validator.validate(&value, &self.inner.envelope).into_error() {
            tracing::debug!(%id, error = ?error.kind, "Invalid request envelope");
            return Response::error(id, ErrorDetails::invalid_request(JsonValue::from(flatten(&error))));
        }

        let Request { method, params, .. } = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                // The envelope schema should make this impossible
                tracing::warn!(%id, error = %e, "Request passed envelope validation but failed to deserialize");
                return Response::error(id, ErrorDetails::invalid_request(JsonValue::String(e.to_string())));
            }
        };

        tracing::Span::current().record("method", method.as_str());

        let Some(entry) = self.inner.registry.get(&method) else {
            tracing::debug!(%id, "Method not found");
            return Response::error(id, ErrorDetails::method_not_found(None));
        };

        let mut params = params.unwrap_or_else(|| JsonValue::Object(Default::default()));

        if let Some(defaults) = self.inner.registry.defaults_schema(&method) {
            let injected = inject_defaults(&mut params, defaults);
            if injected > 0 {
                tracing::trace!(injected, "Filled in default params");
            }
        }

        if let Some(schema) = entry.params_schema() {
            if let Some(error) = self.inner.validator.validate(&params, schema).into_error() {
                tracing::debug!(%id, error = ?error.kind, "Invalid params");
                return Response::error(id, ErrorDetails::invalid_params(JsonValue::from(flatten(&error))));
            }
        }

        let context = RequestContext {
            request_id,
            method,
            id: id.clone(),
            extensions,
        };

        match self.dispatch(entry.handler().clone(), params, context).await {
            Ok(result) => Response::success(id, result),
            Err(details) => Response::error(id, details),
        }
    }

    async fn dispatch(
        &self,
        handler: Arc<dyn MethodHandler>,
        params: JsonValue,
        context: RequestContext,
    ) -> Result<JsonValue, ErrorDetails> {
        let method = context.method.clone();
        let call = AssertUnwindSafe(async move { handler.call(params, context).await }).catch_unwind();

        let outcome = match self.inner.config.request_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(self.internal_fault(&method, Fault::Timeout(timeout))),
            },
            None => call.await,
        };

        match outcome {
            Ok(Ok(result)) => {
                tracing::trace!("Handler succeeded");
                Ok(result)
            }
            Ok(Err(HandlerError::Application(details))) => {
                tracing::debug!(code = details.code.code(), message = %details.message, "Handler returned application error");
                Err(details)
            }
            Ok(Err(HandlerError::Internal(error))) => Err(self.internal_fault(&method, Fault::Error(error))),
            Err(payload) => Err(self.internal_fault(&method, Fault::Panic(panic_message(payload)))),
        }
    }

    fn internal_fault(&self, method: &str, fault: Fault) -> ErrorDetails {
        if self.inner.config.is_production() {
            self.inner.fault_reporter.report(method, &fault);
            ErrorDetails::internal_error(None)
        } else {
            tracing::warn!(%method, %fault, "Internal fault in method handler");
            ErrorDetails::internal_error(fault.to_data())
        }
    }
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// Collects everything a [`Pipeline`] needs, and checks it all when building.
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    schemas: Vec<(String, JsonValue)>,
    methods: Vec<Method>,
    formatters: Vec<Box<dyn MessageFormatter>>,
    fault_reporter: Option<Arc<dyn FaultReporter>>,
}

impl PipelineBuilder {
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a schema that params schemas can refer to by `name` with `$ref`.
    pub fn with_schema(mut self, name: impl Into<String>, schema: JsonValue) -> Self {
        self.schemas.push((name.into(), schema));
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a formatter for validation error messages.
    ///
    /// Formatters are consulted in the order they're added, and the built-in messages are used
    /// when none of them has anything to say.
    pub fn with_formatter(mut self, formatter: impl MessageFormatter) -> Self {
        self.formatters.push(Box::new(formatter));
        self
    }

    /// Where to send internal faults in production mode.  Defaults to [`TracingFaultReporter`].
    pub fn with_fault_reporter(mut self, reporter: impl FaultReporter) -> Self {
        self.fault_reporter = Some(Arc::new(reporter));
        self
    }

    /// Build the pipeline.
    ///
    /// Fails if any schema is malformed or refers to a schema that doesn't exist, if schemas
    /// compose each other in a cycle, or if a method is registered twice.
    pub fn build(self) -> Result<Pipeline> {
        let mut schemas = SchemaSet::builder();
        schemas.register(ENVELOPE_SCHEMA_NAME, envelope_schema())?;
        for (name, schema) in self.schemas {
            schemas.register(name, schema)?;
        }
        Registry::register_schemas(&self.methods, &mut schemas)?;

        let schemas = schemas.build()?;
        let envelope = schemas.require(ENVELOPE_SCHEMA_NAME)?.clone();
        let registry = Registry::new(self.methods, &schemas)?;
        let validator = SchemaValidator::with_formatters(schemas, self.formatters);

        tracing::debug!(
            methods = registry.len(),
            schemas = validator.schemas().len(),
            mode = %self.config.mode,
            content_type = %self.config.content_type,
            "Built request pipeline"
        );

        Ok(Pipeline {
            inner: Arc::new(PipelineInner {
                config: self.config,
                validator,
                envelope,
                registry,
                fault_reporter: self.fault_reporter.unwrap_or_else(|| Arc::new(TracingFaultReporter)),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::init_test_logging;
    use crate::{ErrorCode, JsonRpcError};
    use assert_matches::assert_matches;
    use rpcgate_schema::SchemaError;
    use serde_json::json;

    async fn echo(params: JsonValue, _context: RequestContext) -> Result<JsonValue, HandlerError> {
        Ok(params)
    }

    fn pipeline() -> Pipeline {
        Pipeline::builder()
            .with_method(Method::new("echo", echo))
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_media_type_only() {
        let pipeline = pipeline();
        assert!(pipeline.accepts("application/json"));
        assert!(pipeline.accepts("Application/JSON; charset=utf-8"));
        assert!(pipeline.accepts(" application/json ;charset=utf-8"));
        assert!(!pipeline.accepts("text/plain"));
        assert!(!pipeline.accepts("application/json-seq"));
        assert!(!pipeline.accepts(""));
    }

    #[test]
    fn configured_content_type() {
        let pipeline = Pipeline::builder()
            .with_config(PipelineConfig {
                content_type: "application/json-rpc".to_string(),
                ..Default::default()
            })
            .build()
            .unwrap();

        assert!(pipeline.accepts("application/json-rpc"));
        assert!(!pipeline.accepts("application/json"));
        assert!(pipeline.registry().is_empty());
    }

    #[test]
    fn build_failures() {
        assert_matches!(
            Pipeline::builder().with_schema("a", json!({"$ref": "b"})).build(),
            Err(JsonRpcError::Schema {
                source: SchemaError::UnknownReference { .. }
            })
        );

        assert_matches!(
            Pipeline::builder()
                .with_schema("a", json!({"allOf": [{"$ref": "b"}]}))
                .with_schema("b", json!({"$ref": "a"}))
                .build(),
            Err(JsonRpcError::Schema {
                source: SchemaError::CompositionCycle { .. }
            })
        );

        assert_matches!(
            Pipeline::builder().with_schema(ENVELOPE_SCHEMA_NAME, json!({})).build(),
            Err(JsonRpcError::Schema {
                source: SchemaError::DuplicateSchema { .. }
            })
        );
    }

    #[tokio::test]
    async fn handle_echo() {
        init_test_logging();

        let response = pipeline()
            .handle(br#"{"jsonrpc":"2.0","method":"echo","params":{"a":1},"id":"x"}"#, Extensions::new())
            .await;
        assert_eq!(
            response.to_json().unwrap(),
            json!({"jsonrpc": "2.0", "result": {"a": 1}, "id": "x"})
        );
    }

    #[tokio::test]
    async fn handle_parse_error() {
        init_test_logging();

        let response = pipeline().handle(b"{not json", Extensions::new()).await;
        assert_eq!(response.id, Id::Null);
        assert_matches!(
            response.error_details(),
            Some(ErrorDetails {
                code: ErrorCode::ParseError,
                data: Some(JsonValue::String(_)),
                ..
            })
        );
    }

    #[tokio::test]
    async fn serve_passes_through_other_content() {
        init_test_logging();

        let request = InboundRequest::new(Some("text/html"), &b"<html/>"[..]);
        assert_matches!(
            pipeline().serve(request).await,
            Dispatch::PassThrough(InboundRequest { content_type: Some(content_type), .. }) if content_type == "text/html"
        );

        let request = InboundRequest::new(None, &b"{}"[..]);
        assert_matches!(pipeline().serve(request).await, Dispatch::PassThrough(_));
    }

    #[tokio::test]
    async fn serve_reads_body() {
        init_test_logging();

        let request = InboundRequest::new(
            Some("application/json; charset=utf-8"),
            &br#"{"jsonrpc":"2.0","method":"echo","id":3}"#[..],
        );
        assert_matches!(
            pipeline().serve(request).await,
            Dispatch::Handled(response) if response.id == Id::from(3) && !response.is_error()
        );
    }
}
