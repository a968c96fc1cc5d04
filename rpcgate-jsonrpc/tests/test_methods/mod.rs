//! Methods used by the integration tests, and a pipeline with all of them registered.
#![allow(dead_code)] // Not every test program uses everything in here

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;
use rpcgate_jsonrpc::{
    ErrorDetails, HandlerError, JsonValue, Method, Pipeline, PipelineBuilder, PipelineConfig, RequestContext, typed,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Stand-in for whatever an authentication layer would put in the request extensions
#[derive(Clone, Debug)]
pub struct Principal(pub String);

#[derive(Debug, Deserialize)]
pub struct GreetParams {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SumParams {
    pub values: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct SumResult {
    pub sum: f64,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SleepParams {
    pub millis: u64,
}

async fn greet(params: GreetParams, _context: RequestContext) -> Result<String, HandlerError> {
    Ok(format!("hello {}", params.name))
}

async fn sum(params: SumParams, _context: RequestContext) -> Result<SumResult, HandlerError> {
    Ok(SumResult {
        sum: params.values.iter().sum(),
        count: params.values.len(),
    })
}

async fn echo(params: JsonValue, _context: RequestContext) -> Result<JsonValue, HandlerError> {
    Ok(params)
}

async fn context(_params: JsonValue, context: RequestContext) -> Result<JsonValue, HandlerError> {
    Ok(json!({
        "method": context.method,
        "id": context.id,
        "principal": context.extensions.get::<Principal>().map(|principal| principal.0.clone()),
    }))
}

async fn fail_generic(_params: JsonValue, _context: RequestContext) -> Result<(), HandlerError> {
    Err(HandlerError::generic("Something went wrong", json!({"retry": false})))
}

async fn fail_custom(params: JsonValue, _context: RequestContext) -> Result<(), ErrorDetails> {
    Err(ErrorDetails::application(4001, "Quota exceeded", params.get("detail").cloned()))
}

async fn fail_internal(_params: JsonValue, _context: RequestContext) -> Result<(), HandlerError> {
    let lookup: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
    lookup.context("loading user profile")?;
    Ok(())
}

async fn explode(_params: JsonValue, _context: RequestContext) -> Result<(), HandlerError> {
    panic!("kaboom")
}

async fn sleep(params: SleepParams, _context: RequestContext) -> Result<&'static str, HandlerError> {
    tokio::time::sleep(Duration::from_millis(params.millis)).await;
    Ok("awake")
}

/// Schemas that method params schemas compose
fn shared_schemas(builder: PipelineBuilder) -> PipelineBuilder {
    builder
        .with_schema(
            "timestamps",
            json!({
                "properties": {
                    "created_at": { "type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}$", "default": "1970-01-01" }
                }
            }),
        )
        .with_schema(
            "article",
            json!({
                "type": "object",
                "required": ["title"],
                "properties": {
                    "title": { "type": "string", "minLength": 3, "maxLength": 40 },
                    "draft": { "type": "boolean", "default": true }
                }
            }),
        )
}

fn post_schema() -> JsonValue {
    json!({
        "allOf": [{ "$ref": "article" }, { "$ref": "timestamps" }],
        "properties": {
            "tags": { "type": "array", "items": { "type": "string" }, "default": [] },
            "draft": { "type": "boolean", "default": false }
        }
    })
}

/// Every test method, with `calls` counting invocations of `count`
pub fn test_pipeline_builder(calls: Arc<AtomicUsize>) -> PipelineBuilder {
    let count = move |params: JsonValue, _context: RequestContext| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, HandlerError>(params) }
    };

    shared_schemas(Pipeline::builder())
        .with_method(Method::new("greet", typed(greet)).with_params_schema(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string", "default": "world" }
            }
        })))
        .with_method(Method::new("sum", typed(sum)).with_params_schema(json!({
            "type": "object",
            "required": ["values"],
            "additionalProperties": false,
            "properties": {
                "values": { "type": "array", "items": { "type": "number" } }
            }
        })))
        .with_method(Method::new("echo", echo))
        .with_method(Method::new("count", count))
        .with_method(Method::new("context", context))
        .with_method(Method::new("create_post", echo).with_params_schema(post_schema()))
        .with_method(
            Method::new("create_post_raw", echo)
                .with_params_schema(post_schema())
                .skip_defaulting(),
        )
        .with_method(Method::new("fail_generic", fail_generic))
        .with_method(Method::new("fail_custom", fail_custom))
        .with_method(Method::new("fail_internal", fail_internal))
        .with_method(Method::new("explode", explode))
        .with_method(Method::new("sleep", typed(sleep)).with_params_schema(json!({
            "type": "object",
            "required": ["millis"],
            "properties": { "millis": { "type": "integer", "minimum": 0 } }
        })))
}

pub fn test_pipeline_with_config(config: PipelineConfig) -> Pipeline {
    test_pipeline_builder(Arc::new(AtomicUsize::new(0)))
        .with_config(config)
        .build()
        .unwrap()
}

pub fn test_pipeline() -> Pipeline {
    test_pipeline_with_config(PipelineConfig::default())
}
