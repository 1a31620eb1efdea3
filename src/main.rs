//! backup - scheduled rsync backup orchestrator
//!
//! Main entry point for the CLI.
//!
//! # Execution Flow
//!
//! 1. Parse CLI arguments (argument errors exit 3)
//! 2. Resolve the process-wide script configuration from
//!    `<config-root>/config` plus CLI overrides
//! 3. Initialize logging (console, plus the dated run log when configured)
//! 4. Build a current-thread tokio runtime (subprocess execution is
//!    strictly sequential; async only buys captured output and timeouts)
//! 5. Run the orchestrator over every discovered batch
//! 6. Map the first fatal failure to the process exit code: 2 for runtime
//!    state, 3 for configuration content, 0 on success

use clap::Parser;
use owo_colors::OwoColorize;
use rsync_backup::cli::Cli;
use rsync_backup::models::log_warnings;
use rsync_backup::orchestrator::RunError;
use rsync_backup::{config, logging, Orchestrator, SystemRunner, APP_NAME, VERSION};

/// Exit code for invalid arguments or configuration content.
const ARGUMENT_ERROR_EXIT: i32 = 3;

/// Exit code for invalid runtime state (missing tools, unreachable hosts,
/// filesystem failures).
const RUNTIME_ERROR_EXIT: i32 = 2;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap renders help/version on stdout (exit 0) and argument
            // errors with usage on stderr; argument errors exit 3 here,
            // not clap's default 2.
            let is_error = err.use_stderr();
            let _ = err.print();
            std::process::exit(if is_error { ARGUMENT_ERROR_EXIT } else { 0 });
        }
    };
    let color = !cli.no_color;

    let (script, warnings) = match config::resolve_script_config(&cli.overrides()) {
        Ok(resolved) => resolved,
        Err(err) => {
            report_fatal(&err.to_string(), color);
            std::process::exit(RunError::from(err).exit_code());
        }
    };

    let _log_guard = match logging::init_logging(&script) {
        Ok(guard) => guard,
        Err(err) => {
            report_fatal(&format!("{err:#}"), script.log_color);
            std::process::exit(RUNTIME_ERROR_EXIT);
        }
    };

    tracing::info!("starting {} v{}", APP_NAME, VERSION);
    log_warnings(&warnings);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            report_fatal(&format!("failed to build async runtime: {err}"), script.log_color);
            std::process::exit(RUNTIME_ERROR_EXIT);
        }
    };

    let color = script.log_color;
    let orchestrator = Orchestrator::new(script, SystemRunner);
    if let Err(err) = runtime.block_on(orchestrator.run()) {
        tracing::error!("{err}");
        report_fatal(&err.to_string(), color);
        std::process::exit(err.exit_code());
    }
}

/// One formatted error line on the diagnostic stream.
fn report_fatal(message: &str, color: bool) {
    if color {
        eprintln!("{} {message}", "error:".red().bold());
    } else {
        eprintln!("error: {message}");
    }
}
