use crate::models::{BatchConfig, FilterRule, PatternConfig, ScriptConfig};
use crate::services::remote::remote_shell_command;
use crate::services::transport::CommandRequest;
use camino::Utf8PathBuf;

/// The external mirroring mechanism.
pub const RSYNC_PROGRAM: &str = "rsync";

/// Exit code the transfer tool reports for partial transfers, including a
/// source path that does not exist on the remote side.
const PARTIAL_TRANSFER_EXIT: i32 = 23;

/// Exit code for source files that vanished mid-transfer.
const VANISHED_SOURCE_EXIT: i32 = 24;

/// One fully resolved transfer: everything the tool invocation needs,
/// composed from all three configuration layers.
///
/// The argument list produced by [`TransferRequest::to_command`] has a fixed
/// flag order so invocations are reproducible and assertable; the filter
/// rules keep their declaration order because the tool applies them left to
/// right, first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// `user@host:remote_path`
    pub source: String,
    pub destination: Utf8PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
    pub relative_paths: bool,
    pub log_file: Option<Utf8PathBuf>,
    pub remote_shell: String,
    pub filters: Vec<FilterRule>,
    pub allow_missing: bool,
}

impl TransferRequest {
    pub fn new(
        script: &ScriptConfig,
        batch: &BatchConfig,
        pattern: &PatternConfig,
        destination: Utf8PathBuf,
    ) -> Self {
        Self {
            source: format!("{}:{}", batch.endpoint(), pattern.remote_path),
            destination,
            dry_run: script.dry_run,
            verbose: script.verbose,
            relative_paths: script.relative_paths,
            log_file: script.log_to_file.then(|| script.log_file_path.clone()),
            remote_shell: remote_shell_command(batch.ident_file.as_deref(), batch.remote_port),
            filters: pattern.filters.clone(),
            allow_missing: pattern.allow_missing,
        }
    }

    /// Build the tool invocation. Flag order: mode flags, logging, link
    /// handling, archive set, deletions, remote shell, filters, endpoints.
    pub fn to_command(&self) -> CommandRequest {
        let mut args = Vec::new();

        if self.dry_run {
            args.push("--dry-run".to_string());
            args.push("--itemize-changes".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        if self.relative_paths {
            args.push("--relative".to_string());
        }
        if let Some(log_file) = &self.log_file {
            args.push(format!("--log-file={log_file}"));
        }

        args.push("--copy-links".to_string());
        args.push("--keep-dirlinks".to_string());
        args.push("--archive".to_string());
        args.push("--compress".to_string());
        args.push("--human-readable".to_string());
        args.push("--delete".to_string());
        args.push("--delete-excluded".to_string());
        args.push(format!("--rsh={}", self.remote_shell));

        for rule in &self.filters {
            match rule {
                FilterRule::Include(pattern) => args.push(format!("--include={pattern}")),
                FilterRule::Exclude(pattern) => args.push(format!("--exclude={pattern}")),
            }
        }

        args.push(self.source.clone());
        args.push(format!("{}/", self.destination));

        CommandRequest::new(RSYNC_PROGRAM, args)
    }

    /// Whether a non-zero exit is tolerated for this transfer: only when the
    /// pattern allows a missing source and the tool reported the
    /// partial/vanished class of failure.
    pub fn tolerates_exit(&self, exit_code: i32) -> bool {
        self.allow_missing
            && matches!(exit_code, PARTIAL_TRANSFER_EXIT | VANISHED_SOURCE_EXIT)
    }
}
