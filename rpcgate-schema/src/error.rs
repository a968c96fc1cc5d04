use itertools::Itertools;
use thiserror::Error;

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

/// Problems with the schema documents themselves.
///
/// These are always configuration errors, raised while the schema set is being assembled at
/// startup.  Once a [`crate::SchemaSet`] has been built none of these can happen while validating
/// a value.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema '{name}' is not a valid schema document")]
    InvalidSchema {
        source: serde_json::Error,
        name: String,
    },

    #[error("A schema named '{name}' is already registered")]
    DuplicateSchema { name: String },

    #[error("Schema '{schema}' references '{reference}', which is not a registered schema")]
    UnknownReference { schema: String, reference: String },

    #[error("Schema composition cycle: {}", .chain.iter().join(" -> "))]
    CompositionCycle { chain: Vec<String> },

    #[error("No schema named '{name}' is registered")]
    UnknownSchema { name: String },
}
