use crate::config::{non_empty, parse_bool_token, ConfigError};
use crate::models::{ConfigWarning, FilterRule, PatternConfig};
use camino::Utf8Path;

use super::lines::parse_config_file;

/// Resolve one file-selection unit from a single `files.d` entry.
///
/// Key routing differs from the map-shaped resolvers in two ways: `path` is
/// first-wins (later occurrences warn and are ignored), and the
/// `include`/`exclude` directives accumulate in declaration order because
/// the transfer tool evaluates them left to right.
pub fn resolve_pattern_config(
    pattern_file: &Utf8Path,
) -> Result<(PatternConfig, Vec<ConfigWarning>), ConfigError> {
    let parsed = parse_config_file(pattern_file)?;
    let mut warnings = parsed.warnings.clone();

    let mut remote_path: Option<String> = None;
    let mut target_subpath: Option<String> = None;
    let mut allow_missing = false;
    let mut filters = Vec::new();

    for line in &parsed.lines {
        let value = line.value.as_str();
        match line.key.as_str() {
            "path" => {
                if remote_path.is_some() {
                    warnings.push(ConfigWarning::DuplicateField {
                        file: pattern_file.to_owned(),
                        line_number: line.line_number,
                        field: "path".to_string(),
                    });
                } else {
                    remote_path = Some(value.to_string());
                }
            }
            "include" | "exclude" => {
                let pattern = non_empty(value)
                    .ok_or_else(|| ConfigError::MissingRequiredField {
                        file: pattern_file.to_owned(),
                        field: line.key.clone(),
                    })?
                    .to_string();
                if line.key == "include" {
                    filters.push(FilterRule::Include(pattern));
                } else {
                    filters.push(FilterRule::Exclude(pattern));
                }
            }
            "target" => target_subpath = non_empty(value).map(str::to_string),
            "allow_missing" => {
                allow_missing = parse_bool_token(pattern_file, "allow_missing", value)?
            }
            key => warnings.push(ConfigWarning::UnrecognizedKey {
                file: pattern_file.to_owned(),
                line_number: line.line_number,
                key: key.to_string(),
            }),
        }
    }

    let remote_path = remote_path.filter(|path| !path.is_empty()).ok_or_else(|| {
        ConfigError::MissingRequiredField {
            file: pattern_file.to_owned(),
            field: "path".to_string(),
        }
    })?;

    let pattern = PatternConfig {
        source_file: pattern_file.to_owned(),
        remote_path,
        target_subpath,
        allow_missing,
        filters,
    };
    Ok((pattern, warnings))
}
