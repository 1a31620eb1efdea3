use crate::config::ConfigError;
use crate::models::ConfigWarning;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;

/// A single parsed `key=value` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLine {
    pub key: String,
    pub value: String,
    /// 1-based, for diagnostics.
    pub line_number: usize,
}

/// Ordered parse result for one configuration file.
///
/// The parser preserves file order and leaves precedence to the resolvers:
/// map-shaped resolvers fold through [`ParsedLines::last_wins`], the pattern
/// resolver walks [`ParsedLines::lines`] directly because `path` is
/// first-wins and include/exclude order is significant.
#[derive(Debug, Clone)]
pub struct ParsedLines {
    pub path: Utf8PathBuf,
    pub lines: Vec<ConfigLine>,
    pub warnings: Vec<ConfigWarning>,
}

impl ParsedLines {
    /// Last-wins view keyed by directive name, preserving first-appearance
    /// order for deterministic diagnostics.
    pub fn last_wins(&self) -> IndexMap<&str, &ConfigLine> {
        let mut map = IndexMap::new();
        for line in &self.lines {
            map.insert(line.key.as_str(), line);
        }
        map
    }
}

/// Parse one `key=value` file.
///
/// Blank lines and lines whose first non-whitespace character is `#` are
/// ignored. A line without a `=`, or with nothing before it, is recorded as
/// a malformed-line warning and skipped. The value is everything after the
/// first `=` and may itself contain `=` or be empty.
///
/// Fails with [`ConfigError::ConfigNotFound`] when `path` does not reference
/// a regular file.
pub fn parse_config_file(path: &Utf8Path) -> Result<ParsedLines, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ConfigNotFound { path: path.to_owned() });
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })?;

    let mut lines = Vec::new();
    let mut warnings = Vec::new();

    for (index, raw) in contents.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) if !key.is_empty() => lines.push(ConfigLine {
                key: key.to_string(),
                value: value.to_string(),
                line_number,
            }),
            _ => warnings.push(ConfigWarning::MalformedLine {
                file: path.to_owned(),
                line_number,
                content: line.to_string(),
            }),
        }
    }

    Ok(ParsedLines {
        path: path.to_owned(),
        lines,
        warnings,
    })
}
