//! The code that runs in response to a method call is called a "handler".  All such code
//! implements [`MethodHandler`], although it's not intended that most users will implement that
//! directly.
//!
//! Any `async` closure or function taking the raw params and a [`RequestContext`] is already a
//! handler, and [`typed`] wraps one that would rather take its params as a Rust struct.
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::types::{Id, JsonValue};
use crate::{Extensions, HandlerError, JsonRpcError};

/// Everything a handler might want to know about the request it's handling, besides the params.
#[derive(Debug)]
pub struct RequestContext {
    /// Unique ID for this request, generated by the pipeline.  Also recorded on the request's
    /// tracing span, so handlers can use it to correlate their own logs.
    pub request_id: Uuid,
    /// Name of the method being invoked
    pub method: String,
    /// The caller's request ID, which will be echoed back in the response
    pub id: Id,
    /// Whatever the transport attached to the request
    pub extensions: Extensions,
}

/// A handler for a JSON-RPC method.
///
/// By the time a handler is called, the params have had defaults filled in and have passed
/// validation against the method's params schema, if it declares one.  Methods called without
/// params get an empty object.
#[async_trait]
pub trait MethodHandler: Send + Sync + 'static {
    async fn call(&self, params: JsonValue, context: RequestContext) -> Result<JsonValue, HandlerError>;
}

/// Any async function of the right shape is a handler.  The success value just needs to be
/// serializable, and the error convertible into [`HandlerError`] (which covers
/// [`crate::ErrorDetails`] and [`anyhow::Error`]).
#[async_trait]
impl<F, Fut, T, E> MethodHandler for F
where
    F: Fn(JsonValue, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Serialize + Send + 'static,
    E: Into<HandlerError> + Send + 'static,
{
    async fn call(&self, params: JsonValue, context: RequestContext) -> Result<JsonValue, HandlerError> {
        let result = (self)(params, context).await.map_err(Into::into)?;
        to_result_json(result)
    }
}

/// Adapt a handler that takes its params as some deserializable type.
///
/// If the params don't deserialize, the caller gets an invalid params error and the handler is
/// never called.  Ideally the method's params schema rules that out before it gets this far.
pub fn typed<F, Fut, P, T, E>(handler: F) -> Typed<F, P>
where
    F: Fn(P, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    E: Into<HandlerError> + Send + 'static,
{
    Typed {
        handler,
        _params: PhantomData,
    }
}

/// See [`typed`]
pub struct Typed<F, P> {
    handler: F,
    _params: PhantomData<fn() -> P>,
}

#[async_trait]
impl<F, Fut, P, T, E> MethodHandler for Typed<F, P>
where
    F: Fn(P, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    E: Into<HandlerError> + Send + 'static,
{
    async fn call(&self, params: JsonValue, context: RequestContext) -> Result<JsonValue, HandlerError> {
        let params: P = serde_json::from_value(params).map_err(|e| {
            tracing::debug!(
                method = %context.method,
                params_type = std::any::type_name::<P>(),
                error = %e,
                "Params failed to deserialize"
            );
            HandlerError::invalid_params(JsonValue::String(e.to_string()))
        })?;

        let result = (self.handler)(params, context).await.map_err(Into::into)?;
        to_result_json(result)
    }
}

fn to_result_json<T: Serialize>(result: T) -> Result<JsonValue, HandlerError> {
    serde_json::to_value(result).map_err(|e| {
        HandlerError::Internal(
            JsonRpcError::SerResponse {
                source: e,
                type_name: std::any::type_name::<T>(),
            }
            .into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorDetails;
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use serde_json::json;

    fn context(method: &str) -> RequestContext {
        RequestContext {
            request_id: Uuid::now_v7(),
            method: method.to_string(),
            id: Id::from(1),
            extensions: Extensions::new(),
        }
    }

    #[tokio::test]
    async fn closure_handlers() {
        let echo = |params: JsonValue, _context: RequestContext| async move { Ok::<_, HandlerError>(params) };
        assert_eq!(echo.call(json!({"a": 1}), context("echo")).await.unwrap(), json!({"a": 1}));

        let method_name = |_params: JsonValue, context: RequestContext| async move {
            Ok::<_, ErrorDetails>(format!("called {}", context.method))
        };
        assert_eq!(
            method_name.call(json!({}), context("whoami")).await.unwrap(),
            json!("called whoami")
        );
    }

    #[tokio::test]
    async fn closure_errors_convert() {
        let application = |_params: JsonValue, _context: RequestContext| async move {
            Err::<(), _>(ErrorDetails::generic("Nope", None))
        };
        assert_matches!(
            application.call(json!({}), context("m")).await,
            Err(HandlerError::Application(ErrorDetails { message, .. })) if message == "Nope"
        );

        let internal = |_params: JsonValue, _context: RequestContext| async move {
            Err::<(), _>(anyhow::anyhow!("disk full"))
        };
        assert_matches!(internal.call(json!({}), context("m")).await, Err(HandlerError::Internal(_)));
    }

    #[tokio::test]
    async fn extensions_reach_the_handler() {
        struct Principal(&'static str);

        let whoami = |_params: JsonValue, context: RequestContext| async move {
            Ok::<_, HandlerError>(context.extensions.get::<Principal>().map(|p| p.0))
        };

        let mut ctx = context("whoami");
        ctx.extensions.insert(Principal("alice"));
        assert_eq!(whoami.call(json!({}), ctx).await.unwrap(), json!("alice"));
        assert_eq!(whoami.call(json!({}), context("whoami")).await.unwrap(), JsonValue::Null);
    }

    #[derive(Deserialize)]
    struct GreetParams {
        name: String,
    }

    #[tokio::test]
    async fn typed_handlers() {
        let greet = typed(|params: GreetParams, _context: RequestContext| async move {
            Ok::<_, HandlerError>(format!("hello {}", params.name))
        });

        assert_eq!(
            greet.call(json!({"name": "world"}), context("greet")).await.unwrap(),
            json!("hello world")
        );

        assert_matches!(
            greet.call(json!({"name": 5}), context("greet")).await,
            Err(HandlerError::Application(details)) if details.code.code() == -32602
        );
    }
}
