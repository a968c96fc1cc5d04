use std::any::Any;
use std::path::PathBuf;

use rpcgate_schema::SchemaError;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::types::ErrorDetails;

pub type Result<T, E = JsonRpcError> = std::result::Result<T, E>;

/// Errors setting up or configuring a pipeline.
///
/// Nothing that goes wrong while a request is being processed shows up here; those problems are
/// always reported to the caller as a JSON-RPC error response.
#[derive(Debug, Error)]
pub enum JsonRpcError {
    #[error("Invalid schema configuration")]
    Schema {
        #[from]
        source: SchemaError,
    },
    #[error("Invalid parameter schema for method '{method}'")]
    MethodSchema { method: String, source: SchemaError },
    #[error("Method '{method}' is registered more than once")]
    DuplicateMethod { method: String },
    #[error("Error reading configuration file {}", path.display())]
    ReadConfig { source: std::io::Error, path: PathBuf },
    #[error("Error parsing configuration")]
    ParseConfig {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid value '{value}' for environment variable {var}: {reason}")]
    InvalidEnvVar {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("Error serializing {type_name} to JSON")]
    SerResponse {
        source: serde_json::Error,
        type_name: &'static str,
    },
}

/// The ways a method handler can fail.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An error the handler raised on purpose.
    ///
    /// The details are sent to the caller exactly as given, in every mode, so the handler must
    /// not put anything in here it doesn't want the caller to see.
    #[error("Application error {}: {}", .0.code.code(), .0.message)]
    Application(ErrorDetails),

    /// Anything else.  Reported as an internal error, with the details only exposed outside of
    /// production.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    /// Application error with a caller-chosen code
    pub fn application(code: i32, message: impl Into<String>, data: impl Into<Option<JsonValue>>) -> Self {
        Self::Application(ErrorDetails::application(code, message, data))
    }

    /// Application error with the generic code `0`
    pub fn generic(message: impl Into<String>, data: impl Into<Option<JsonValue>>) -> Self {
        Self::Application(ErrorDetails::generic(message, data))
    }

    pub fn invalid_params(data: impl Into<Option<JsonValue>>) -> Self {
        Self::Application(ErrorDetails::invalid_params(data))
    }

    pub fn internal(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Internal(anyhow::Error::msg(message))
    }
}

impl From<ErrorDetails> for HandlerError {
    fn from(details: ErrorDetails) -> Self {
        Self::Application(details)
    }
}

/// Get the message out of a panic payload.
///
/// `panic!` with a literal produces `&'static str`, with a format string a `String`; anything
/// else gets a placeholder.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => message.to_string(),
            Err(_) => "Handler panicked with a non-string payload".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn application_errors_keep_their_details() {
        let error = HandlerError::generic("Out of widgets", json!({"widgets": 0}));
        assert_matches!(&error, HandlerError::Application(details) if details.code.code() == 0);
        assert_eq!(error.to_string(), "Application error 0: Out of widgets");

        let error: HandlerError = ErrorDetails::application(42, "Nope", None).into();
        assert_matches!(error, HandlerError::Application(ErrorDetails { message, .. }) if message == "Nope");
    }

    #[test]
    fn anyhow_errors_are_internal() {
        fn fallible() -> Result<(), HandlerError> {
            let query: anyhow::Result<()> = Err(anyhow::anyhow!("database is on fire"));
            query?;
            Ok(())
        }

        assert_matches!(fallible(), Err(HandlerError::Internal(e)) if e.to_string() == "database is on fire");
        assert_matches!(HandlerError::internal("boom"), HandlerError::Internal(_));
    }

    #[test]
    fn panic_payloads() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload), "static message");

        let value = 7;
        let payload = std::panic::catch_unwind(|| panic!("formatted {value}")).unwrap_err();
        assert_eq!(panic_message(payload), "formatted 7");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42u32)).unwrap_err();
        assert_eq!(panic_message(payload), "Handler panicked with a non-string payload");
    }
}
