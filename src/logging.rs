//! Logging configuration for policy-qa

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::AppConfig;
use crate::Result;

const LOG_FILE_PREFIX: &str = "policy-qa.log";

/// Initialize console and file logging from configuration
///
/// `RUST_LOG`, when set, takes precedence over `logging.level`.
pub fn init_logging_with_config(config: &AppConfig) -> Result<()> {
    let level = &config.logging.level;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},policy_qa={level}")));
    init_registry(env_filter, &config.logging.log_dir, level)
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str, log_dir: &str) -> Result<()> {
    init_registry(
        EnvFilter::new(format!("{level},policy_qa={level}")),
        log_dir,
        level,
    )
}

fn init_registry(env_filter: EnvFilter, log_dir: &str, level: &str) -> Result<()> {
    let logs_dir = Path::new(log_dir);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::PolicyQaError::Custom(format!("Failed to initialize logging: {e}")))?;

    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    tracing::info!("Log files will be saved to: {log_dir}/{LOG_FILE_PREFIX}.YYYY-MM-DD");

    // The writer thread must outlive every span; the process owns it until exit
    std::mem::forget(guard);

    Ok(())
}
