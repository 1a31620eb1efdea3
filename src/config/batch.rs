use crate::config::{non_empty, parse_bool_token, ConfigError};
use crate::models::{BatchConfig, ConfigWarning, ScriptConfig, DEFAULT_REMOTE_USER};
use camino::{Utf8Path, Utf8PathBuf};

use super::lines::parse_config_file;

/// Resolve one batch's configuration from `<batch_dir>/config`.
///
/// The batch `id` defaults to the directory's base name. A directory that
/// made it into discovery but has no `config` file is a configuration bug,
/// not a skippable state, so the [`ConfigError::ConfigNotFound`] from the
/// parser propagates and aborts the run.
///
/// The effective identity file is computed here: the batch-level override
/// when present, otherwise the script-level default. Only the batch-level
/// override is existence-checked; the script default was already validated.
pub fn resolve_batch_config(
    batch_dir: &Utf8Path,
    script: &ScriptConfig,
) -> Result<(BatchConfig, Vec<ConfigWarning>), ConfigError> {
    let config_path = batch_dir.join("config");
    let parsed = parse_config_file(&config_path)?;
    let mut warnings = parsed.warnings.clone();

    let mut id = batch_dir.file_name().unwrap_or_default().to_string();
    let mut skip = false;
    let mut remote_user = DEFAULT_REMOTE_USER.to_string();
    let mut remote_host = String::new();
    let mut remote_port: Option<u16> = None;
    let mut ident_file: Option<Utf8PathBuf> = None;
    let mut remote_script: Option<Utf8PathBuf> = None;

    for (key, line) in parsed.last_wins() {
        let value = line.value.as_str();
        match key {
            "id" => {
                if let Some(value) = non_empty(value) {
                    id = value.to_string();
                }
            }
            "skip" => skip = parse_bool_token(&config_path, key, value)?,
            "remote_user" => remote_user = value.to_string(),
            "remote_host" => remote_host = value.to_string(),
            "remote_port" => remote_port = Some(parse_port(&config_path, key, value)?),
            "ident_file" => ident_file = non_empty(value).map(Utf8PathBuf::from),
            "remote_script" => remote_script = non_empty(value).map(Utf8PathBuf::from),
            _ => warnings.push(ConfigWarning::UnrecognizedKey {
                file: config_path.clone(),
                line_number: line.line_number,
                key: key.to_string(),
            }),
        }
    }

    if remote_host.is_empty() {
        return Err(ConfigError::MissingRequiredField {
            file: config_path.clone(),
            field: "remote_host".to_string(),
        });
    }
    if remote_user.is_empty() {
        return Err(ConfigError::MissingRequiredField {
            file: config_path.clone(),
            field: "remote_user".to_string(),
        });
    }
    if let Some(ident) = &ident_file {
        if !ident.is_file() {
            return Err(ConfigError::PathNotFound {
                file: config_path.clone(),
                field: "ident_file".to_string(),
                path: ident.clone(),
            });
        }
    }
    if let Some(script_path) = &remote_script {
        if !script_path.is_file() {
            return Err(ConfigError::PathNotFound {
                file: config_path.clone(),
                field: "remote_script".to_string(),
                path: script_path.clone(),
            });
        }
    }

    let ident_file = ident_file.or_else(|| script.default_ident_file.clone());

    let batch = BatchConfig {
        id,
        skip,
        remote_user,
        remote_host,
        remote_port,
        ident_file,
        remote_script,
    };
    Ok((batch, warnings))
}

fn parse_port(file: &Utf8Path, field: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse::<u16>()
        .ok()
        .filter(|port| *port > 0)
        .ok_or_else(|| ConfigError::InvalidIntegerValue {
            file: file.to_owned(),
            field: field.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn script_config(root: &Utf8Path) -> ScriptConfig {
        ScriptConfig {
            config_root: root.to_owned(),
            target_root: root.to_owned(),
            default_ident_file: None,
            verbose: false,
            dry_run: false,
            relative_paths: true,
            log_color: true,
            log_to_file: false,
            log_root: Utf8PathBuf::from("/var/logs/rsync-backup"),
            log_date_format: "%Y-%m-%d".to_string(),
            log_file_path: Utf8PathBuf::from("/var/logs/rsync-backup/backup-.log"),
            transfer_timeout: None,
            filter_id: None,
        }
    }

    fn batch_dir(dir: &TempDir, name: &str, config: &str) -> Utf8PathBuf {
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let batch = root.join(name);
        fs::create_dir(&batch).unwrap();
        fs::write(batch.join("config"), config).unwrap();
        batch
    }

    #[test]
    fn test_id_defaults_to_directory_name() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let (batch, _) = resolve_batch_config(&batch_path, &script_config(&root)).unwrap();
        assert_eq!(batch.id, "db");
        assert_eq!(batch.remote_user, "root");
        assert_eq!(batch.remote_host, "h");
        assert!(batch.remote_port.is_none());
        assert!(!batch.skip);
    }

    #[test]
    fn test_id_override() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\nid=database\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let (batch, _) = resolve_batch_config(&batch_path, &script_config(&root)).unwrap();
        assert_eq!(batch.id, "database");
    }

    #[test]
    fn test_missing_remote_host_is_fatal() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_user=backup\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let err = resolve_batch_config(&batch_path, &script_config(&root)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRequiredField { ref field, .. } if field == "remote_host"
        ));
    }

    #[test]
    fn test_emptied_remote_user_is_fatal() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\nremote_user=\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let err = resolve_batch_config(&batch_path, &script_config(&root)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRequiredField { ref field, .. } if field == "remote_user"
        ));
    }

    #[test]
    fn test_port_parsing() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\nremote_port=2222\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let (batch, _) = resolve_batch_config(&batch_path, &script_config(&root)).unwrap();
        assert_eq!(batch.remote_port, Some(2222));
    }

    #[test]
    fn test_bad_port_is_invalid_integer() {
        for bad in ["h22", "-1", "0", "65536", ""] {
            let dir = TempDir::new().unwrap();
            let batch_path =
                batch_dir(&dir, "db", &format!("remote_host=h\nremote_port={bad}\n"));
            let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

            let err = resolve_batch_config(&batch_path, &script_config(&root)).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidIntegerValue { .. }),
                "port `{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn test_skip_requires_bool_token() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\nskip=maybe\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let err = resolve_batch_config(&batch_path, &script_config(&root)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnumValue { .. }));
    }

    #[test]
    fn test_ident_falls_back_to_script_default() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let default_ident = root.join("id_default");
        fs::write(&default_ident, "key material").unwrap();

        let batch_path = batch_dir(&dir, "db", "remote_host=h\n");
        let mut script = script_config(&root);
        script.default_ident_file = Some(default_ident.clone());

        let (batch, _) = resolve_batch_config(&batch_path, &script).unwrap();
        assert_eq!(batch.ident_file, Some(default_ident));
    }

    #[test]
    fn test_batch_ident_overrides_script_default() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let default_ident = root.join("id_default");
        let batch_ident = root.join("id_batch");
        fs::write(&default_ident, "a").unwrap();
        fs::write(&batch_ident, "b").unwrap();

        let batch_path = batch_dir(&dir, "db", &format!("remote_host=h\nident_file={batch_ident}\n"));
        let mut script = script_config(&root);
        script.default_ident_file = Some(default_ident);

        let (batch, _) = resolve_batch_config(&batch_path, &script).unwrap();
        assert_eq!(batch.ident_file, Some(batch_ident));
    }

    #[test]
    fn test_missing_batch_ident_is_path_not_found() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\nident_file=/nonexistent/key\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let err = resolve_batch_config(&batch_path, &script_config(&root)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PathNotFound { ref field, .. } if field == "ident_file"
        ));
    }

    #[test]
    fn test_missing_remote_script_is_path_not_found() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\nremote_script=/nonexistent/prep.sh\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let err = resolve_batch_config(&batch_path, &script_config(&root)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PathNotFound { ref field, .. } if field == "remote_script"
        ));
    }

    #[test]
    fn test_absent_config_file_is_config_not_found() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let batch = root.join("empty-batch");
        fs::create_dir(&batch).unwrap();

        let err = resolve_batch_config(&batch, &script_config(&root)).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_unrecognized_key_warns() {
        let dir = TempDir::new().unwrap();
        let batch_path = batch_dir(&dir, "db", "remote_host=h\ncompression=zstd\n");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let (_, warnings) = resolve_batch_config(&batch_path, &script_config(&root)).unwrap();
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::UnrecognizedKey { key, .. } if key == "compression")));
    }
}
