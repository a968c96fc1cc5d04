//! Rust struct definitions that ser/de to/from JSON-RPC messages.
//!
//! Only the single request/response exchange is modeled; this crate doesn't deal in batches or
//! notifications.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{JsonRpcError, Result};
/// Re-export the basic protocol types from `jsonrpsee-types`.
///
/// No need to re-invent this wheel.  The error codes in particular carry the standard messages
/// for the reserved codes, which are exactly what we send back.
pub use jsonrpsee_types::{error::ErrorCode, params::TwoPointZero};
pub use serde_json::Value as JsonValue;

/// Request Id
///
/// Any JSON value is accepted as an id and echoed back unchanged.  Numbers and strings get their
/// own variants since they're what well-behaved clients send.
#[derive(Debug, PartialEq, Clone, Eq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Id {
    /// Null, and also what's used when the request's id could not be determined
    #[default]
    Null,
    /// Numeric id
    Number(serde_json::Number),
    /// String id
    Str(String),
    /// Any other JSON value, such as a boolean or an object
    Other(JsonValue),
}

impl Id {
    /// Try to recover the request id from a decoded JSON value that may not be a valid request.
    ///
    /// Error responses should carry the request's id whenever it could be read, even if the
    /// rest of the request was garbage.  A body that isn't an object, or has no `id`, yields
    /// `Null`.
    pub fn recover(value: &JsonValue) -> Self {
        value.get("id").map(Id::from).unwrap_or_default()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Null => f.write_str("null"),
            Id::Number(number) => write!(f, "{number}"),
            Id::Str(string) => write!(f, "\"{string}\""),
            Id::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id::Number(value.into())
    }
}

impl From<&JsonValue> for Id {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Id::Null,
            JsonValue::Number(number) => Id::Number(number.clone()),
            JsonValue::String(string) => Id::Str(string.clone()),
            other => Id::Other(other.clone()),
        }
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

/// Serializable [JSON-RPC request object](https://www.jsonrpc.org/specification#request-object).
///
/// The shape of the envelope is checked against the envelope schema before a request is
/// deserialized into this struct, which is why it's lenient about the version tag and the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// JSON-RPC version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<TwoPointZero>,
    /// Name of the method to be invoked.
    pub method: String,
    /// Parameter values of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonValue>,
    /// Request ID
    #[serde(default)]
    pub id: Id,
}

impl Request {
    /// Create a serializable JSON-RPC method call.
    pub fn new(id: Id, method: impl Into<String>, params: impl Into<Option<JsonValue>>) -> Self {
        Self {
            jsonrpc: Some(TwoPointZero),
            method: method.into(),
            params: params.into(),
            id,
        }
    }
}

/// JSON-RPC response object as defined by [JSON-RPC 2.0](https://www.jsonrpc.org/specification#response_object).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// JSON-RPC version.
    pub jsonrpc: TwoPointZero,
    /// Payload which can be result or error.
    #[serde(flatten)]
    pub payload: ResponsePayload,
    /// Request ID
    pub id: Id,
}

impl Response {
    pub fn new(id: Id, payload: ResponsePayload) -> Self {
        Self {
            jsonrpc: TwoPointZero,
            payload,
            id,
        }
    }

    /// Create a owned successful response
    pub fn success(id: Id, result: JsonValue) -> Self {
        Self::new(id, ResponsePayload::success(result))
    }

    /// Create an error response
    pub fn error(id: Id, details: impl Into<ErrorDetails>) -> Self {
        Self::new(id, ResponsePayload::error(details))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    /// The error details, if this is an error response
    pub fn error_details(&self) -> Option<&ErrorDetails> {
        match &self.payload {
            ResponsePayload::Error(ErrorResponse { error }) => Some(error),
            ResponsePayload::Success(_) => None,
        }
    }

    /// Serialize this response for the transport.
    ///
    /// This is fallible but unlikely to fail barring memory issues.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| JsonRpcError::SerResponse {
            source: e,
            type_name: std::any::type_name::<Self>(),
        })
    }

    pub fn to_json(&self) -> Result<JsonValue> {
        serde_json::to_value(self).map_err(|e| JsonRpcError::SerResponse {
            source: e,
            type_name: std::any::type_name::<Self>(),
        })
    }
}

/// Possible payloads of a JSON RPC response
///
/// This is an `untagged` enum so that serde will try to deserialize into each variant in order
/// until one succeeds.  This works because successs responses should have `result` and error
/// responses should have `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Corresponds to failed JSON-RPC response with a error object with the field `error.
    Error(ErrorResponse),
    /// Corresponds to successful JSON-RPC response with the field `result`.
    Success(SuccessResponse),
}

impl ResponsePayload {
    /// Create a successful response payload
    pub fn success(result: JsonValue) -> Self {
        ResponsePayload::Success(SuccessResponse { result })
    }

    /// Create an error response payload
    pub fn error(details: impl Into<ErrorDetails>) -> Self {
        ResponsePayload::Error(details.into().into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub result: JsonValue,
}

impl From<JsonValue> for SuccessResponse {
    fn from(result: JsonValue) -> Self {
        Self { result }
    }
}

/// [Failed JSON-RPC response object](https://www.jsonrpc.org/specification#error_object).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

impl From<ErrorDetails> for ErrorResponse {
    fn from(error: ErrorDetails) -> Self {
        Self { error }
    }
}

/// [JSON-RPC failed response error details](https://www.jsonrpc.org/specification#error_object).
///
/// `data` is always present on the wire, as `null` when there is nothing to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Code
    pub code: ErrorCode,
    /// Message
    pub message: String,
    /// Optional data
    #[serde(default)]
    pub data: Option<JsonValue>,
}

impl ErrorDetails {
    /// Code used for application errors that don't pick a code of their own
    pub const GENERIC_ERROR_CODE: i32 = 0;

    pub fn new(code: ErrorCode, message: impl Into<String>, data: impl Into<Option<JsonValue>>) -> Self {
        Self {
            code,
            message: message.into(),
            data: data.into(),
        }
    }

    /// Error details for one of the reserved codes, with that code's standard message
    pub fn from_code(code: ErrorCode, data: impl Into<Option<JsonValue>>) -> Self {
        Self::new(code, code.message(), data)
    }

    pub fn parse_error(data: impl Into<Option<JsonValue>>) -> Self {
        Self::from_code(ErrorCode::ParseError, data)
    }
    pub fn invalid_request(data: impl Into<Option<JsonValue>>) -> Self {
        Self::from_code(ErrorCode::InvalidRequest, data)
    }
    pub fn method_not_found(data: impl Into<Option<JsonValue>>) -> Self {
        Self::from_code(ErrorCode::MethodNotFound, data)
    }
    pub fn invalid_params(data: impl Into<Option<JsonValue>>) -> Self {
        Self::from_code(ErrorCode::InvalidParams, data)
    }
    pub fn internal_error(data: impl Into<Option<JsonValue>>) -> Self {
        Self::from_code(ErrorCode::InternalError, data)
    }

    /// An application-defined error with a caller-chosen code
    pub fn application(code: i32, message: impl Into<String>, data: impl Into<Option<JsonValue>>) -> Self {
        Self::new(ErrorCode::from(code), message, data)
    }

    /// An application error with the generic code `0`
    pub fn generic(message: impl Into<String>, data: impl Into<Option<JsonValue>>) -> Self {
        Self::application(Self::GENERIC_ERROR_CODE, message, data)
    }
}
