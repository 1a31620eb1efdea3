use crate::models::BatchConfig;
use crate::services::transport::CommandRequest;
use camino::{Utf8Path, Utf8PathBuf};

/// The reachability probe and remote hooks both ride on ssh.
pub const SSH_PROGRAM: &str = "ssh";

/// Connect timeout for the reachability probe, in seconds. Keeps an
/// unreachable host from stalling the run waiting for TCP.
const PROBE_CONNECT_TIMEOUT_SECS: u32 = 5;

fn ident_port_args(ident_file: Option<&Utf8Path>, port: Option<u16>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(ident) = ident_file {
        args.push("-i".to_string());
        args.push(ident.to_string());
    }
    if let Some(port) = port {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    args
}

/// Base ssh options shared by the probe, the hook, and the transfer tool's
/// remote shell: batch mode suppresses interactive credential prompts, and
/// identity/port ride along when configured.
fn base_ssh_args(ident_file: Option<&Utf8Path>, port: Option<u16>) -> Vec<String> {
    let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
    args.extend(ident_port_args(ident_file, port));
    args
}

/// Remote-shell command string handed to the transfer tool.
pub fn remote_shell_command(ident_file: Option<&Utf8Path>, port: Option<u16>) -> String {
    let mut parts = vec![SSH_PROGRAM.to_string()];
    parts.extend(base_ssh_args(ident_file, port));
    parts.join(" ")
}

/// Non-interactive connectivity check preceding any transfer for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub remote_user: String,
    pub remote_host: String,
    pub remote_port: Option<u16>,
    pub ident_file: Option<Utf8PathBuf>,
}

impl ProbeRequest {
    pub fn from_batch(batch: &BatchConfig) -> Self {
        Self {
            remote_user: batch.remote_user.clone(),
            remote_host: batch.remote_host.clone(),
            remote_port: batch.remote_port,
            ident_file: batch.ident_file.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}@{}", self.remote_user, self.remote_host)
    }

    /// `ssh -o BatchMode=yes -o ConnectTimeout=5 [-i ident] [-p port] user@host true`
    pub fn to_command(&self) -> CommandRequest {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={PROBE_CONNECT_TIMEOUT_SECS}"),
        ];
        args.extend(ident_port_args(self.ident_file.as_deref(), self.remote_port));
        args.push(self.endpoint());
        args.push("true".to_string());
        CommandRequest::new(SSH_PROGRAM, args)
    }
}

/// A pre-transfer hook: the contents of a local script shipped to the
/// remote shell over the batch's connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRequest {
    pub remote_user: String,
    pub remote_host: String,
    pub remote_port: Option<u16>,
    pub ident_file: Option<Utf8PathBuf>,
    pub script_body: String,
}

impl HookRequest {
    pub fn new(batch: &BatchConfig, script_body: String) -> Self {
        Self {
            remote_user: batch.remote_user.clone(),
            remote_host: batch.remote_host.clone(),
            remote_port: batch.remote_port,
            ident_file: batch.ident_file.clone(),
            script_body,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}@{}", self.remote_user, self.remote_host)
    }

    /// The script body rides as the remote command argument; the remote
    /// login shell executes it as-is, multi-line bodies included.
    pub fn to_command(&self) -> CommandRequest {
        let mut args = base_ssh_args(self.ident_file.as_deref(), self.remote_port);
        args.push(self.endpoint());
        args.push(self.script_body.clone());
        CommandRequest::new(SSH_PROGRAM, args)
    }
}
