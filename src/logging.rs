//! Tracing setup for the wizard.
//!
//! The TUI owns the terminal while it runs, so its events go to a session
//! file under `{paths.state}/logs`. The headless subcommands log to stderr.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Where log events are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Session file inside this directory
    File(PathBuf),
    Stderr,
}

/// Keeps the file writer alive; drop it last so buffered events are flushed
pub struct LoggingHandle {
    pub _guard: Option<WorkerGuard>,
    /// Session log, when logging to a file
    pub log_file_path: Option<PathBuf>,
}

/// Session log name, e.g. `module-wizard-20261019T101500Z.log`
pub fn log_file_name() -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    format!("module-wizard-{timestamp}.log")
}

/// `--debug` wins over `logging.level`
pub fn effective_level(config: &Config, debug_override: bool) -> String {
    if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    }
}

/// File only for the TUI, and only when `logging.to_file` is set
pub fn log_target(config: &Config, is_tui_mode: bool) -> LogTarget {
    if is_tui_mode && config.logging.to_file {
        LogTarget::File(config.logs_path())
    } else {
        LogTarget::Stderr
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, replaces the level.
pub fn init_logging(
    config: &Config,
    is_tui_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let directive =
        std::env::var("RUST_LOG").unwrap_or_else(|_| effective_level(config, debug_override));
    let filter = EnvFilter::new(directive);

    match log_target(config, is_tui_mode) {
        LogTarget::File(logs_dir) => {
            std::fs::create_dir_all(&logs_dir).with_context(|| {
                format!("Failed to create log directory {}", logs_dir.display())
            })?;
            let file_name = log_file_name();
            let appender = tracing_appender::rolling::never(&logs_dir, &file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();

            Ok(LoggingHandle {
                _guard: Some(guard),
                log_file_path: Some(logs_dir.join(file_name)),
            })
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();

            Ok(LoggingHandle {
                _guard: None,
                log_file_path: None,
            })
        }
    }
}
