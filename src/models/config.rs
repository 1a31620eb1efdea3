use camino::Utf8PathBuf;
use std::time::Duration;

/// Default remote login user for batches that do not set `remote_user`.
pub const DEFAULT_REMOTE_USER: &str = "root";

/// Default directory for run logs when `log_root` is not configured.
pub const DEFAULT_LOG_ROOT: &str = "/var/logs/rsync-backup";

/// Default strftime pattern for the dated log file name.
pub const DEFAULT_LOG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Process-wide settings resolved once per run.
///
/// Produced by [`resolve_script_config`](crate::config::resolve_script_config)
/// from built-in defaults, CLI overrides, and the root `config` file (in that
/// precedence order for `verbose`, `dry_run`, `log_color` and the config root;
/// every other field only ever comes from the file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Root of the configuration tree (CLI positional argument).
    pub config_root: Utf8PathBuf,

    /// Existing directory receiving `<batch-id>[/<target_subpath>]` trees.
    pub target_root: Utf8PathBuf,

    /// Identity file used for batches that do not carry their own.
    pub default_ident_file: Option<Utf8PathBuf>,

    pub verbose: bool,
    pub dry_run: bool,

    /// Preserve source path components on transfer (`--relative`).
    pub relative_paths: bool,

    pub log_color: bool,
    pub log_to_file: bool,
    pub log_root: Utf8PathBuf,
    pub log_date_format: String,

    /// `log_root/backup-<formatted date>.log`, fixed at resolution time.
    pub log_file_path: Utf8PathBuf,

    /// Optional per-transfer wall-clock limit. Unset means wait indefinitely,
    /// which is the historical behavior.
    pub transfer_timeout: Option<Duration>,

    /// Restricts the run to a single batch id (CLI `--id`).
    pub filter_id: Option<String>,
}

/// One remote host's backup configuration, resolved from
/// `config_root/<batch-id>/config`.
///
/// Created fresh for each batch directory the orchestrator visits and
/// discarded once that batch's transfers complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Batch identity; defaults to the directory's base name.
    pub id: String,

    /// Skipped batches get no connectivity check and no transfers.
    pub skip: bool,

    pub remote_user: String,
    pub remote_host: String,
    pub remote_port: Option<u16>,

    /// Effective identity file: the batch-level override when present,
    /// otherwise the script-level default.
    pub ident_file: Option<Utf8PathBuf>,

    /// Local script whose contents run on the remote host before transfers.
    pub remote_script: Option<Utf8PathBuf>,
}

impl BatchConfig {
    /// `user@host` form used by the probe, the hook, and transfer sources.
    pub fn endpoint(&self) -> String {
        format!("{}@{}", self.remote_user, self.remote_host)
    }
}

/// A single include or exclude directive from a pattern file.
///
/// Directives are kept in one sequence in file order: the transfer tool
/// evaluates its filter rules left to right, first match wins, so relative
/// order between includes and excludes is load-bearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRule {
    Include(String),
    Exclude(String),
}

impl FilterRule {
    pub fn pattern(&self) -> &str {
        match self {
            FilterRule::Include(pat) | FilterRule::Exclude(pat) => pat,
        }
    }

    pub fn is_include(&self) -> bool {
        matches!(self, FilterRule::Include(_))
    }
}

/// One file-selection unit, resolved from a single file in a `files.d`
/// directory (shared or batch-owned). Recomputed from scratch for every
/// pattern file processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConfig {
    /// Pattern file this configuration came from, for diagnostics.
    pub source_file: Utf8PathBuf,

    /// Remote path to mirror. First `path` line wins; duplicates warn.
    pub remote_path: String,

    /// Optional extra component under `target_root/<batch-id>/`.
    pub target_subpath: Option<String>,

    /// Tolerate an absent remote path instead of failing the run.
    pub allow_missing: bool,

    /// Include/exclude directives in declaration order.
    pub filters: Vec<FilterRule>,
}

impl PatternConfig {
    /// Include patterns in declaration order.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().filter(|r| r.is_include()).map(FilterRule::pattern)
    }

    /// Exclude patterns in declaration order.
    pub fn excludes(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().filter(|r| !r.is_include()).map(FilterRule::pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_endpoint() {
        let batch = BatchConfig {
            id: "db".to_string(),
            skip: false,
            remote_user: DEFAULT_REMOTE_USER.to_string(),
            remote_host: "backup.example.net".to_string(),
            remote_port: None,
            ident_file: None,
            remote_script: None,
        };
        assert_eq!(batch.endpoint(), "root@backup.example.net");
    }

    #[test]
    fn test_filter_rule_accessors() {
        let include = FilterRule::Include("*.conf".to_string());
        let exclude = FilterRule::Exclude("*.tmp".to_string());

        assert!(include.is_include());
        assert!(!exclude.is_include());
        assert_eq!(include.pattern(), "*.conf");
        assert_eq!(exclude.pattern(), "*.tmp");
    }

    #[test]
    fn test_pattern_filter_views_preserve_order() {
        let pattern = PatternConfig {
            source_file: Utf8PathBuf::from("files.d/etc"),
            remote_path: "/etc".to_string(),
            target_subpath: None,
            allow_missing: false,
            filters: vec![
                FilterRule::Include("a/".to_string()),
                FilterRule::Exclude("a/cache/".to_string()),
                FilterRule::Include("b/".to_string()),
            ],
        };

        assert_eq!(pattern.includes().collect::<Vec<_>>(), vec!["a/", "b/"]);
        assert_eq!(pattern.excludes().collect::<Vec<_>>(), vec!["a/cache/"]);
    }
}
