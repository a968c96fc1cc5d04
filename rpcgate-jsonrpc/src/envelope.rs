use serde_json::json;

use crate::types::JsonValue;

/// Name of the schema every request body is validated against before anything else happens
pub const ENVELOPE_SCHEMA_NAME: &str = "rpcgate:envelope";

/// The shape of a single JSON-RPC request object.
///
/// Only `method` is required.  A missing `jsonrpc` is tolerated but a wrong one isn't.  The `id`
/// may be any JSON value and a missing one is answered with `id: null`.  Params, if present, must
/// be by-name.  An empty method name is left for the method lookup to reject.
pub(crate) fn envelope_schema() -> JsonValue {
    json!({
        "type": "object",
        "required": ["method"],
        "properties": {
            "jsonrpc": { "enum": ["2.0"] },
            "method": { "type": "string" },
            "params": { "type": "object" }
        }
    })
}
