use camino::Utf8PathBuf;
use std::fmt;

/// Non-fatal diagnostics produced while parsing configuration files.
///
/// Warnings are collected by the resolvers and surfaced through the log
/// stream by the caller; they never change the process exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A non-comment line without a `=` separator, or with an empty key.
    MalformedLine {
        file: Utf8PathBuf,
        line_number: usize,
        content: String,
    },
    /// A second occurrence of a first-wins key (`path` in pattern files).
    DuplicateField {
        file: Utf8PathBuf,
        line_number: usize,
        field: String,
    },
    /// A syntactically valid line whose key is not part of the file kind's
    /// recognized set.
    UnrecognizedKey {
        file: Utf8PathBuf,
        line_number: usize,
        key: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MalformedLine { file, line_number, content } => {
                write!(f, "{file}:{line_number}: skipping malformed line `{content}`")
            }
            ConfigWarning::DuplicateField { file, line_number, field } => {
                write!(f, "{file}:{line_number}: duplicate `{field}` ignored (first occurrence wins)")
            }
            ConfigWarning::UnrecognizedKey { file, line_number, key } => {
                write!(f, "{file}:{line_number}: unrecognized key `{key}`")
            }
        }
    }
}

/// Emit collected warnings into the log stream.
pub fn log_warnings(warnings: &[ConfigWarning]) {
    for warning in warnings {
        tracing::warn!("{warning}");
    }
}
