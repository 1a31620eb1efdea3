use crate::config::{non_empty, parse_bool_token, ConfigError};
use crate::models::{
    ConfigWarning, ScriptConfig, DEFAULT_LOG_DATE_FORMAT, DEFAULT_LOG_ROOT,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use std::time::Duration;

use super::lines::parse_config_file;

/// CLI-supplied values captured during argument parsing.
///
/// Only flags the operator actually passed are `Some`; an absent flag must
/// not shadow a file-supplied value, so plain `bool`s would be wrong here.
#[derive(Debug, Clone, Default)]
pub struct ScriptOverrides {
    pub config_root: Utf8PathBuf,
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
    pub log_color: Option<bool>,
    pub filter_id: Option<String>,
}

impl ScriptOverrides {
    pub fn new(config_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_root: config_root.into(),
            ..Self::default()
        }
    }
}

/// Resolve the process-wide configuration from `<config_root>/config`.
///
/// Resolution order: built-in defaults, then CLI overrides, then the file
/// (skipping `verbose`/`dry_run`/`log_color`/`config_root` when the CLI
/// already set them), then computed defaults for still-unset booleans, then
/// validation. `--dry-run` forces `verbose` regardless of file contents.
///
/// Returns the resolved config plus the non-fatal warnings gathered along
/// the way; the caller logs them once the subscriber is installed.
pub fn resolve_script_config(
    overrides: &ScriptOverrides,
) -> Result<(ScriptConfig, Vec<ConfigWarning>), ConfigError> {
    let config_path = overrides.config_root.join("config");
    let parsed = parse_config_file(&config_path)?;
    let mut warnings = parsed.warnings.clone();

    let mut verbose = overrides.verbose;
    let mut dry_run = overrides.dry_run;
    let mut log_color = overrides.log_color;
    let mut relative_paths: Option<bool> = None;
    let mut log_to_file: Option<bool> = None;
    let mut target_root: Option<Utf8PathBuf> = None;
    let mut default_ident_file: Option<Utf8PathBuf> = None;
    let mut log_root = Utf8PathBuf::from(DEFAULT_LOG_ROOT);
    let mut log_date_format = DEFAULT_LOG_DATE_FORMAT.to_string();
    let mut transfer_timeout: Option<Duration> = None;

    for (key, line) in parsed.last_wins() {
        let value = line.value.as_str();
        match key {
            "target" => target_root = non_empty(value).map(Utf8PathBuf::from),
            "ident_file" => default_ident_file = non_empty(value).map(Utf8PathBuf::from),
            "verbose" => {
                if verbose.is_none() {
                    verbose = Some(parse_bool_token(&config_path, key, value)?);
                }
            }
            "dry_run" => {
                if dry_run.is_none() {
                    dry_run = Some(parse_bool_token(&config_path, key, value)?);
                }
            }
            "log_color" => {
                if log_color.is_none() {
                    log_color = Some(parse_bool_token(&config_path, key, value)?);
                }
            }
            // The config root is a mandatory CLI positional; a file-supplied
            // value is always shadowed.
            "config_root" => {}
            "relative_paths" => {
                relative_paths = Some(parse_bool_token(&config_path, key, value)?)
            }
            "log_to_file" => log_to_file = Some(parse_bool_token(&config_path, key, value)?),
            "log_root" => {
                if let Some(value) = non_empty(value) {
                    log_root = Utf8PathBuf::from(value);
                }
            }
            "log_date_format" => {
                if let Some(value) = non_empty(value) {
                    log_date_format = value.to_string();
                }
            }
            "transfer_timeout" => {
                transfer_timeout = Some(parse_timeout_secs(&config_path, key, value)?)
            }
            _ => warnings.push(ConfigWarning::UnrecognizedKey {
                file: config_path.clone(),
                line_number: line.line_number,
                key: key.to_string(),
            }),
        }
    }

    let log_to_file = log_to_file.unwrap_or(false);
    // Color defaults off once output goes to a log file.
    let log_color = log_color.unwrap_or(!log_to_file);
    let dry_run = dry_run.unwrap_or(false);
    let verbose = verbose.unwrap_or(false) || dry_run;
    let relative_paths = relative_paths.unwrap_or(true);

    let target_root = target_root.ok_or_else(|| ConfigError::MissingRequiredField {
        file: config_path.clone(),
        field: "target".to_string(),
    })?;
    if !target_root.is_dir() {
        return Err(ConfigError::PathNotFound {
            file: config_path.clone(),
            field: "target".to_string(),
            path: target_root,
        });
    }
    if let Some(ident) = &default_ident_file {
        if !ident.is_file() {
            return Err(ConfigError::PathNotFound {
                file: config_path.clone(),
                field: "ident_file".to_string(),
                path: ident.clone(),
            });
        }
    }
    if log_to_file && !log_root.is_dir() {
        return Err(ConfigError::PathNotFound {
            file: config_path.clone(),
            field: "log_root".to_string(),
            path: log_root,
        });
    }
    validate_date_format(&config_path, &log_date_format)?;

    let log_file_path = log_root.join(format!(
        "backup-{}.log",
        Local::now().format(&log_date_format)
    ));

    let script = ScriptConfig {
        config_root: overrides.config_root.clone(),
        target_root,
        default_ident_file,
        verbose,
        dry_run,
        relative_paths,
        log_color,
        log_to_file,
        log_root,
        log_date_format,
        log_file_path,
        transfer_timeout,
        filter_id: overrides.filter_id.clone(),
    };
    Ok((script, warnings))
}

fn parse_timeout_secs(
    file: &Utf8Path,
    field: &str,
    value: &str,
) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidIntegerValue {
            file: file.to_owned(),
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Reject broken strftime patterns at resolve time; a bad pattern would
/// otherwise only blow up when the log path is formatted.
fn validate_date_format(file: &Utf8Path, format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidEnumValue {
            file: file.to_owned(),
            field: "log_date_format".to_string(),
            value: format.to_string(),
        });
    }
    Ok(())
}
