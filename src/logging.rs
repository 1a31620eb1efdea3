use crate::models::ScriptConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Setup logging according to the resolved script configuration.
///
/// A console layer always writes to stdout, with ANSI colors per
/// `log_color` and debug level when `verbose`. When `log_to_file` is set an
/// additional appending file layer writes one timestamped line per message
/// to the resolved `backup-<date>.log`; the file never carries ANSI codes.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep the
/// file appender flushing; `None` when no file layer was installed.
pub fn init_logging(
    script: &ScriptConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = if script.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(script.log_color)
        .with_target(false);

    if script.log_to_file {
        let file_name = script
            .log_file_path
            .file_name()
            .unwrap_or("backup.log")
            .to_string();
        // `never` rotation appends to the same dated file across runs; the
        // date in the name comes from the resolver, not the appender.
        let file_appender = tracing_appender::rolling::never(&script.log_root, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("failed to initialize logging")?;

        tracing::debug!("logging to {}", script.log_file_path);
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init()
            .context("failed to initialize logging")?;
        Ok(None)
    }
}
