//! Configuration loading and validation.
//!
//! Three resolvers share one flat `key=value` line format (see [`lines`]):
//! - [`resolve_script_config`]: root `config`, process-wide settings,
//!   CLI-override aware
//! - [`resolve_batch_config`]: `<batch-id>/config`, per-host connectivity
//! - [`resolve_pattern_config`]: `files.d/*`, one transfer unit each
//!
//! Each resolver routes recognized keys into typed fields, collects
//! [`ConfigWarning`](crate::models::ConfigWarning)s for everything else, and
//! validates at the end. Validation failures are fatal to the whole run;
//! warnings are not.

pub mod batch;
pub mod lines;
pub mod pattern;
pub mod script;

pub use batch::resolve_batch_config;
pub use lines::{parse_config_file, ConfigLine, ParsedLines};
pub use pattern::resolve_pattern_config;
pub use script::{resolve_script_config, ScriptOverrides};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Fatal configuration failures.
///
/// Everything here aborts the run before the next side effect. The
/// content-class variants map to process exit code 3, the filesystem-state
/// variants to exit code 2.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    ConfigNotFound { path: Utf8PathBuf },

    #[error("{file}: missing required field `{field}`")]
    MissingRequiredField { file: Utf8PathBuf, field: String },

    #[error("{file}: field `{field}` must be `true` or `false`, got `{value}`")]
    InvalidEnumValue {
        file: Utf8PathBuf,
        field: String,
        value: String,
    },

    #[error("{file}: field `{field}` must be a positive integer, got `{value}`")]
    InvalidIntegerValue {
        file: Utf8PathBuf,
        field: String,
        value: String,
    },

    #[error("{file}: field `{field}` points to a missing path: {path}")]
    PathNotFound {
        file: Utf8PathBuf,
        field: String,
        path: Utf8PathBuf,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// True for errors in configuration *content* (exit code 3), false for
    /// filesystem-state errors (exit code 2).
    pub fn is_content_error(&self) -> bool {
        !matches!(self, ConfigError::PathNotFound { .. } | ConfigError::Io { .. })
    }
}

/// Validate one of the strict `true`/`false` boolean tokens.
pub(crate) fn parse_bool_token(
    file: &Utf8Path,
    field: &str,
    value: &str,
) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidEnumValue {
            file: file.to_owned(),
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

pub(crate) fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
