//! Data models for the backup orchestrator.
//!
//! This module contains the resolved configuration structures threaded through a run:
//! - [`ScriptConfig`]: Process-wide settings resolved from CLI arguments and the root `config` file
//! - [`BatchConfig`]: One remote host's backup configuration, resolved per batch directory
//! - [`PatternConfig`]: One file-selection unit from a `files.d` directory
//! - [`ConfigWarning`]: Non-fatal diagnostics surfaced while parsing any of the above
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Immutable**: Each resolver in [`crate::config`](crate::config) produces a finished
//!   struct; nothing mutates configuration after validation
//! - **Plain data**: No I/O and no subprocess handles live here, so every consumer
//!   (orchestrator, services, tests) can construct them directly

pub mod config;
pub mod warning;

pub use config::{
    BatchConfig, FilterRule, PatternConfig, ScriptConfig, DEFAULT_LOG_DATE_FORMAT,
    DEFAULT_LOG_ROOT, DEFAULT_REMOTE_USER,
};
pub use warning::{log_warnings, ConfigWarning};
