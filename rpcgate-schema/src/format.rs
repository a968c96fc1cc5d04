//! Human-readable messages for validation errors.
//!
//! A [`crate::SchemaValidator`] holds an ordered list of [`MessageFormatter`]s fixed at
//! construction.  For each violation the formatters are consulted in order and the first one
//! producing a non-empty message wins; [`DefaultFormatter`] is always consulted last so every
//! violation gets a message.
use itertools::Itertools;

use crate::{ErrorKind, ErrorTarget};

pub trait MessageFormatter: Send + Sync + 'static {
    /// Produce a message for the violation, or `None` to defer to the next formatter.
    fn format(&self, kind: &ErrorKind, target: &ErrorTarget) -> Option<String>;
}

impl<F> MessageFormatter for F
where
    F: Fn(&ErrorKind, &ErrorTarget) -> Option<String> + Send + Sync + 'static,
{
    fn format(&self, kind: &ErrorKind, target: &ErrorTarget) -> Option<String> {
        self(kind, target)
    }
}

/// The built-in English messages
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFormatter;

impl MessageFormatter for DefaultFormatter {
    fn format(&self, kind: &ErrorKind, _target: &ErrorTarget) -> Option<String> {
        let message = match kind {
            ErrorKind::Type { expected, found } => {
                format!("Expected type {} but found type {found}", expected.iter().join(" or "))
            }
            ErrorKind::Required { field } => format!("Missing required property: {field}"),
            ErrorKind::MinLength { limit, actual } => {
                format!("String is too short ({actual} chars), minimum {limit}")
            }
            ErrorKind::MaxLength { limit, actual } => {
                format!("String is too long ({actual} chars), maximum {limit}")
            }
            ErrorKind::Pattern { pattern } => format!("String does not match pattern {pattern}"),
            ErrorKind::Enum { allowed } => {
                format!("Value is not one of the allowed values: {}", allowed.iter().join(", "))
            }
            ErrorKind::Minimum { limit, actual } => format!("Value {actual} is less than minimum {limit}"),
            ErrorKind::Maximum { limit, actual } => format!("Value {actual} is greater than maximum {limit}"),
            ErrorKind::AdditionalProperty { name } => format!("Additional property {name} is not allowed"),
            ErrorKind::AllOf { index } => format!("Value does not satisfy allOf schema {index}"),
            ErrorKind::Multiple { count } => format!("{count} validation errors"),
        };

        Some(message)
    }
}
