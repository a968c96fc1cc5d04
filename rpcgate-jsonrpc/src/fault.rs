//! Internal faults: anything that went wrong in a handler other than an application error the
//! handler raised on purpose.
use std::fmt;
use std::time::Duration;

use serde_json::json;

use crate::types::JsonValue;

/// Something went wrong inside a handler that the caller shouldn't have to know about.
#[derive(Debug)]
pub enum Fault {
    /// The handler returned an internal error
    Error(anyhow::Error),
    /// The handler panicked; this is the panic message
    Panic(String),
    /// The handler didn't finish within the configured request timeout, and was abandoned
    Timeout(Duration),
}

impl Fault {
    /// Describe the fault for the `data` field of the error response.
    ///
    /// Only sent outside of production.
    pub fn to_data(&self) -> JsonValue {
        match self {
            Fault::Error(error) => json!({
                "message": error.to_string(),
                "causes": error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
            }),
            Fault::Panic(message) => json!({
                "message": format!("Handler panicked: {message}"),
            }),
            Fault::Timeout(timeout) => json!({
                "message": self.to_string(),
                "timeout": humantime::format_duration(*timeout).to_string(),
            }),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Error(error) => write!(f, "{error:#}"),
            Fault::Panic(message) => write!(f, "Handler panicked: {message}"),
            Fault::Timeout(timeout) => write!(
                f,
                "Handler did not complete within {}",
                humantime::format_duration(*timeout)
            ),
        }
    }
}

/// Where internal faults go in production mode, since they aren't sent to the caller.
///
/// Called on the task processing the request, inside its `rpc_request` span.  Implementations
/// shouldn't block; hand the fault off to something else if reporting it is slow.
pub trait FaultReporter: Send + Sync + 'static {
    fn report(&self, method: &str, fault: &Fault);
}

impl<F> FaultReporter for F
where
    F: Fn(&str, &Fault) + Send + Sync + 'static,
{
    fn report(&self, method: &str, fault: &Fault) {
        self(method, fault)
    }
}

/// Reports faults as `tracing` errors.  This is what a pipeline uses unless told otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFaultReporter;

impl FaultReporter for TracingFaultReporter {
    fn report(&self, method: &str, fault: &Fault) {
        tracing::error!(%method, %fault, "Internal fault in method handler");
    }
}
