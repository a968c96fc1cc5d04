//! A pipeline with a single method `greet`, whose `name` param defaults to "world".
//!
//! Request bodies are fed to the pipeline through an in-memory pipe standing in for a transport.
//! Run with `RPCGATE_MODE=production` or `RUST_LOG=debug` to see how the output changes.
use rpcgate_jsonrpc::{Dispatch, HandlerError, InboundRequest, Method, Pipeline, PipelineConfig, RequestContext, typed};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncWriteExt, duplex};

#[derive(Deserialize)]
struct GreetParams {
    name: String,
}

async fn greet(params: GreetParams, _context: RequestContext) -> Result<String, HandlerError> {
    if params.name.eq_ignore_ascii_case("nobody") {
        return Err(HandlerError::generic("Nobody to greet", json!({ "name": params.name })));
    }

    Ok(format!("hello {}", params.name))
}

/// Send `body` to the pipeline the way a transport would, returning the response body
async fn send(pipeline: &Pipeline, content_type: &str, body: &str) -> String {
    let (mut client, server) = duplex(1024);
    client.write_all(body.as_bytes()).await.unwrap();
    // Closing our end is what tells the pipeline the body is complete
    drop(client);

    match pipeline.serve(InboundRequest::new(Some(content_type), server)).await {
        Dispatch::Handled(response) => String::from_utf8(response.to_bytes().unwrap()).unwrap(),
        Dispatch::PassThrough(_) => format!("<not JSON-RPC, passed through: {content_type}>"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let pipeline = Pipeline::builder()
        .with_config(PipelineConfig::from_env()?)
        .with_method(Method::new("greet", typed(greet)).with_params_schema(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string", "minLength": 1, "default": "world" }
            }
        })))
        .build()?;

    let requests = [
        ("application/json", r#"{"jsonrpc":"2.0","method":"greet","params":{},"id":1}"#),
        ("application/json", r#"{"jsonrpc":"2.0","method":"greet","params":{"name":"Ferris"},"id":2}"#),
        ("application/json", r#"{"jsonrpc":"2.0","method":"greet","params":{"name":123},"id":3}"#),
        ("application/json", r#"{"jsonrpc":"2.0","method":"greet","params":{"name":"nobody"},"id":4}"#),
        ("application/json", r#"{"jsonrpc":"2.0","method":"farewell","id":5}"#),
        ("application/json; charset=utf-8", r#"{"jsonrpc":"2.0","id":6}"#),
        ("application/json", r#"{"jsonrpc":"2.0","method":"#),
        ("text/plain", "hello?"),
    ];

    for (content_type, body) in requests {
        println!("→ {body}");
        println!("← {}\n", send(&pipeline, content_type, body).await);
    }

    Ok(())
}
