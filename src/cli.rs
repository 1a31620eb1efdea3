//! CLI argument parsing via `clap`.

use crate::config::ScriptOverrides;
use camino::Utf8PathBuf;
use clap::Parser;

/// Scheduled backup orchestrator: resolves a declarative configuration tree
/// and drives one rsync transfer per (batch, pattern) pair.
#[derive(Parser, Debug)]
#[command(name = "backup", version, about = "Scheduled rsync backup orchestrator")]
pub struct Cli {
    /// Configuration root: holds the script `config`, optional shared
    /// `files.d`, and one subdirectory per batch
    #[arg(value_name = "CONFIG_ROOT")]
    pub config_root: String,

    /// Restrict the run to a single batch id
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Verbose diagnostics (debug-level logging, verbose transfers)
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable ANSI colors on the console
    #[arg(long)]
    pub no_color: bool,

    /// Preview transfers without changing any files (implies --verbose)
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Only flags the operator actually passed become overrides; everything
    /// else stays `None` so file-supplied values can fill in.
    pub fn overrides(&self) -> ScriptOverrides {
        ScriptOverrides {
            config_root: Utf8PathBuf::from(self.config_root.as_str()),
            verbose: self.verbose.then_some(true),
            dry_run: self.dry_run.then_some(true),
            log_color: self.no_color.then_some(false),
            filter_id: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::try_parse_from(["backup", "/etc/backup.d"]).unwrap();
        assert_eq!(cli.config_root, "/etc/backup.d");
        assert!(!cli.verbose);
        assert!(!cli.dry_run);
        assert!(!cli.no_color);
        assert!(cli.id.is_none());
    }

    #[test]
    fn test_overrides_only_carry_passed_flags() {
        let cli = Cli::try_parse_from(["backup", "--dry-run", "/etc/backup.d"]).unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.dry_run, Some(true));
        assert_eq!(overrides.verbose, None);
        assert_eq!(overrides.log_color, None);
    }

    #[test]
    fn test_no_color_maps_to_log_color_false() {
        let cli = Cli::try_parse_from(["backup", "--no-color", "/etc/backup.d"]).unwrap();
        assert_eq!(cli.overrides().log_color, Some(false));
    }

    #[test]
    fn test_id_filter() {
        let cli = Cli::try_parse_from(["backup", "--id", "db", "/etc/backup.d"]).unwrap();
        assert_eq!(cli.overrides().filter_id.as_deref(), Some("db"));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["backup", "--frobnicate", "/etc/backup.d"]).is_err());
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        assert!(Cli::try_parse_from(["backup", "/a", "/b"]).is_err());
    }

    #[test]
    fn test_missing_config_root_is_rejected() {
        assert!(Cli::try_parse_from(["backup"]).is_err());
    }
}
