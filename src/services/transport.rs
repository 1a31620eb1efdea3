use std::future::Future;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// One external command, fully resolved to an argument vector.
///
/// Requests are plain values so argv construction can be unit tested and a
/// fake runner can record them without touching the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Log-friendly rendering of the full command line.
    pub fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// Captured result of an executed command.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, for surfacing remote hook output.
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }
}

/// Errors from the execution layer itself, as opposed to non-zero exits.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {limit:?}")]
    Timeout { program: String, limit: Duration },
}

/// Narrow seam between the orchestrator and the operating system.
///
/// Production uses [`SystemRunner`]; tests substitute a recording fake so a
/// full run can be driven without ssh or rsync installed.
pub trait ProcessRunner: Send + Sync {
    /// Execute the request, capturing output. `time_limit` of `None` waits
    /// indefinitely.
    fn run(
        &self,
        request: &CommandRequest,
        time_limit: Option<Duration>,
    ) -> impl Future<Output = Result<ProcessOutput, TransportError>> + Send;

    /// Preflight lookup for a required external tool.
    fn tool_available(&self, tool: &str) -> bool;
}

/// Executes requests as real subprocesses via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        request: &CommandRequest,
        time_limit: Option<Duration>,
    ) -> Result<ProcessOutput, TransportError> {
        tracing::debug!("executing: {}", request.display());
        let start = Instant::now();

        let mut command = Command::new(&request.program);
        command.args(&request.args).stdin(Stdio::null());

        let io_result = match time_limit {
            Some(limit) => timeout(limit, command.output()).await.map_err(|_| {
                tracing::warn!("`{}` timed out after {:?}", request.program, limit);
                TransportError::Timeout {
                    program: request.program.clone(),
                    limit,
                }
            })?,
            None => command.output().await,
        };
        let output = io_result.map_err(|source| TransportError::Spawn {
            program: request.program.clone(),
            source,
        })?;

        let duration = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            "`{}` completed in {:.2}s with exit code {}",
            request.program,
            duration.as_secs_f32(),
            exit_code
        );

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
        })
    }

    fn tool_available(&self, tool: &str) -> bool {
        which::which(tool).is_ok()
    }
}
