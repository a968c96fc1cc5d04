use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{JsonRpcError, Result};

const MODE_VAR: &str = "RPCGATE_MODE";
const CONTENT_TYPE_VAR: &str = "RPCGATE_CONTENT_TYPE";
const REQUEST_TIMEOUT_VAR: &str = "RPCGATE_REQUEST_TIMEOUT";

/// Whether internal faults are reported to the caller in detail or kept to ourselves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// Internal faults are sent back to the caller in the error's `data`
    #[default]
    Development,
    /// Internal faults are reported to the fault reporter, and the caller learns nothing beyond
    /// the fact that something went wrong
    Production,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub mode: Mode,

    /// Requests with any other content type are passed through untouched.
    ///
    /// Only the media type is compared, so `application/json; charset=utf-8` is still JSON.
    pub content_type: String,

    /// The maximum amount of time to allow a method handler to execute before abandoning it and
    /// responding to the caller with an internal error.
    ///
    /// `None` indicates no limit.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            content_type: "application/json".to_string(),
            request_timeout: None,
        }
    }
}

impl PipelineConfig {
    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| JsonRpcError::ReadConfig {
            source,
            path: path.to_path_buf(),
        })?;

        tracing::debug!(path = %path.display(), "Loading pipeline config");
        Self::from_yaml_str(&yaml)
    }

    /// Defaults, overridden by whichever of `RPCGATE_MODE`, `RPCGATE_CONTENT_TYPE` and
    /// `RPCGATE_REQUEST_TIMEOUT` are set.
    ///
    /// The timeout is a human-readable duration like `30s` or `1m 30s`; `none` or an empty value
    /// turn the timeout off.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from variables looked up with `lookup`, using the same names and syntax as
    /// [`Self::from_env`].
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup(MODE_VAR) {
            self.mode = value.parse().map_err(|e: strum::ParseError| JsonRpcError::InvalidEnvVar {
                var: MODE_VAR,
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }

        if let Some(value) = lookup(CONTENT_TYPE_VAR) {
            self.content_type = value;
        }

        if let Some(value) = lookup(REQUEST_TIMEOUT_VAR) {
            let trimmed = value.trim();
            self.request_timeout = if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(
                    humantime::parse_duration(trimmed).map_err(|e| JsonRpcError::InvalidEnvVar {
                        var: REQUEST_TIMEOUT_VAR,
                        value: value.clone(),
                        reason: e.to_string(),
                    })?,
                )
            };
        }

        Ok(self)
    }
}
