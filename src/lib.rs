// rsync-backup - scheduled backup orchestrator
//
// This is the library crate containing the resolution engine and
// orchestration logic. The binary crate (main.rs) provides the CLI entry
// point.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{resolve_script_config, ConfigError, ScriptOverrides};
pub use models::{BatchConfig, ConfigWarning, PatternConfig, ScriptConfig};
pub use orchestrator::{Orchestrator, RunError, RunSummary};
pub use services::{ProcessRunner, SystemRunner};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
