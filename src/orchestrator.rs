//! The control loop turning resolved configuration into an ordered sequence
//! of probe, hook, and transfer invocations.
//!
//! Per run: resolve the script config (done by the caller), preflight the
//! external tools, then per discovered batch: resolve, honor `skip`, probe
//! reachability, run the optional remote hook, and execute one transfer per
//! pattern file (shared patterns first, then batch-owned ones). Execution is
//! strictly sequential; any non-warning failure aborts the whole run.

use crate::config::{self, ConfigError};
use crate::models::{log_warnings, BatchConfig, ScriptConfig};
use crate::services::{
    HookRequest, ProbeRequest, ProcessRunner, TransferRequest, TransportError, RSYNC_PROGRAM,
    SSH_PROGRAM,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Fatal run failures outside configuration content.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("required external tool `{tool}` not found on PATH")]
    MissingExternalTool { tool: &'static str },

    #[error("host {endpoint} is unreachable: {detail}")]
    ConnectivityFailure { endpoint: String, detail: String },

    #[error("remote hook {script} failed on {endpoint} (exit {exit_code}):\n{output}")]
    RemoteHookFailure {
        script: Utf8PathBuf,
        endpoint: String,
        exit_code: i32,
        output: String,
    },

    #[error("failed to create target directory {path}: {source}")]
    DirectoryCreateFailure {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transfer of {src} failed with exit code {exit_code}")]
    TransferFailure { src: String, exit_code: i32 },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RunError {
    /// Process exit code: 3 for configuration content, 2 for runtime state.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Config(err) if err.is_content_error() => 3,
            _ => 2,
        }
    }
}

/// Counters accumulated across a run and logged at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches_run: usize,
    pub batches_skipped: usize,
    pub transfers: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn log(&self) {
        tracing::info!(
            "run complete: {} batches processed, {} skipped, {} transfers in {:.2}s",
            self.batches_run,
            self.batches_skipped,
            self.transfers,
            self.elapsed.as_secs_f64()
        );
    }
}

/// Drives one full run over a resolved [`ScriptConfig`].
///
/// Generic over the [`ProcessRunner`] so integration tests substitute a
/// recording fake for the system transport.
pub struct Orchestrator<R> {
    script: ScriptConfig,
    runner: R,
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn new(script: ScriptConfig, runner: R) -> Self {
        Self { script, runner }
    }

    pub fn script(&self) -> &ScriptConfig {
        &self.script
    }

    /// Require the external tools before any network activity.
    fn preflight(&self) -> Result<(), RunError> {
        for tool in [SSH_PROGRAM, RSYNC_PROGRAM] {
            if !self.runner.tool_available(tool) {
                return Err(RunError::MissingExternalTool { tool });
            }
        }
        Ok(())
    }

    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let start = Instant::now();
        self.preflight()?;

        if self.script.dry_run {
            tracing::info!("dry run: transfers execute in preview mode only");
        }

        let mut summary = RunSummary::default();
        for batch_dir in self.discover_batches()? {
            self.run_batch(&batch_dir, &mut summary).await?;
        }

        summary.elapsed = start.elapsed();
        summary.log();
        Ok(summary)
    }

    /// Immediate subdirectories of the config root, sorted by name. The
    /// root's own `config` file and its shared `files.d` directory are
    /// siblings of the batches, not batches themselves. With a filter id
    /// only that one subdirectory is considered.
    fn discover_batches(&self) -> Result<Vec<Utf8PathBuf>, RunError> {
        if let Some(id) = &self.script.filter_id {
            tracing::info!("restricting run to batch `{id}`");
            return Ok(vec![self.script.config_root.join(id)]);
        }

        let entries = self
            .script
            .config_root
            .read_dir_utf8()
            .map_err(|source| ConfigError::Io {
                path: self.script.config_root.clone(),
                source,
            })?;

        let mut batch_dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::Io {
                path: self.script.config_root.clone(),
                source,
            })?;
            let path = entry.path().to_owned();
            if path.is_dir() && path.file_name() != Some("files.d") {
                batch_dirs.push(path);
            }
        }
        batch_dirs.sort();
        Ok(batch_dirs)
    }

    async fn run_batch(
        &self,
        batch_dir: &Utf8Path,
        summary: &mut RunSummary,
    ) -> Result<(), RunError> {
        let (batch, warnings) = config::resolve_batch_config(batch_dir, &self.script)?;
        log_warnings(&warnings);

        if batch.skip {
            tracing::info!("batch `{}` is marked skip, moving on", batch.id);
            summary.batches_skipped += 1;
            return Ok(());
        }

        tracing::info!("processing batch `{}` ({})", batch.id, batch.endpoint());
        self.check_connectivity(&batch).await?;

        if let Some(script_path) = batch.remote_script.clone() {
            self.run_remote_hook(&batch, &script_path).await?;
        }

        // Shared patterns apply to every non-skipped batch and run first.
        let mut pattern_files = list_pattern_files(&self.script.config_root.join("files.d"))?;
        pattern_files.extend(list_pattern_files(&batch_dir.join("files.d"))?);

        for pattern_file in &pattern_files {
            self.run_transfer(&batch, pattern_file, summary).await?;
        }

        summary.batches_run += 1;
        Ok(())
    }

    async fn check_connectivity(&self, batch: &BatchConfig) -> Result<(), RunError> {
        let probe = ProbeRequest::from_batch(batch);
        let output = self.runner.run(&probe.to_command(), None).await?;
        if !output.success() {
            let detail = match output.stderr.trim() {
                "" => format!("probe exited with code {}", output.exit_code),
                stderr => stderr.to_string(),
            };
            return Err(RunError::ConnectivityFailure {
                endpoint: probe.endpoint(),
                detail,
            });
        }
        tracing::debug!("host {} is reachable", batch.remote_host);
        Ok(())
    }

    async fn run_remote_hook(
        &self,
        batch: &BatchConfig,
        script_path: &Utf8Path,
    ) -> Result<(), RunError> {
        let body = fs::read_to_string(script_path).map_err(|source| ConfigError::Io {
            path: script_path.to_owned(),
            source,
        })?;

        let hook = HookRequest::new(batch, body);
        tracing::info!("running remote hook {} on {}", script_path, hook.endpoint());
        let output = self.runner.run(&hook.to_command(), None).await?;
        if !output.success() {
            return Err(RunError::RemoteHookFailure {
                script: script_path.to_owned(),
                endpoint: hook.endpoint(),
                exit_code: output.exit_code,
                output: output.combined(),
            });
        }
        Ok(())
    }

    async fn run_transfer(
        &self,
        batch: &BatchConfig,
        pattern_file: &Utf8Path,
        summary: &mut RunSummary,
    ) -> Result<(), RunError> {
        let (pattern, warnings) = config::resolve_pattern_config(pattern_file)?;
        log_warnings(&warnings);

        let mut destination = self.script.target_root.join(&batch.id);
        if let Some(subpath) = &pattern.target_subpath {
            destination.push(subpath);
        }
        fs::create_dir_all(&destination).map_err(|source| RunError::DirectoryCreateFailure {
            path: destination.clone(),
            source,
        })?;

        let request = TransferRequest::new(&self.script, batch, &pattern, destination);
        tracing::info!("transferring {} -> {}", request.source, request.destination);

        let output = self
            .runner
            .run(&request.to_command(), self.script.transfer_timeout)
            .await?;
        if !output.success() {
            if request.tolerates_exit(output.exit_code) {
                tracing::warn!(
                    "source {} absent or vanished (exit {}), allow_missing is set, continuing",
                    request.source,
                    output.exit_code
                );
            } else {
                return Err(RunError::TransferFailure {
                    src: request.source,
                    exit_code: output.exit_code,
                });
            }
        }

        summary.transfers += 1;
        Ok(())
    }
}

/// Regular files inside one `files.d` directory, sorted by name. An absent
/// directory is simply an empty pattern set.
fn list_pattern_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, RunError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = dir.read_dir_utf8().map_err(|source| ConfigError::Io {
        path: dir.to_owned(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: dir.to_owned(),
            source,
        })?;
        let path = entry.path().to_owned();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
