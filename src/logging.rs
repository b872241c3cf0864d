//! Rotating log system
//!
//! Console output goes to stderr so `probe` and `inspect` keep stdout clean;
//! a daily-rotated file copy lands in the configured log directory.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "galaxy_flyer.log";
const DEFAULT_FILTER: &str = "info,galaxy_flyer=debug";

/// Install console and file layers. Keep the returned guard alive until exit
/// or buffered file lines are lost.
pub fn init_logging(log_dir: &str) -> WorkerGuard {
    let log_path = Path::new(log_dir);
    if let Err(e) = std::fs::create_dir_all(log_path) {
        eprintln!("Failed to create log directory {}: {}", log_dir, e);
    }

    // galaxy_flyer.log.YYYY-MM-DD
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_path, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the default
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized. Log directory: {}", log_dir);
    guard
}

/// Log an error value with structured fields
#[macro_export]
macro_rules! log_error {
    ($err:expr) => {
        tracing::error!(error = %$err, "Operation failed");
    };
    ($err:expr, $($field:tt)*) => {
        tracing::error!(error = %$err, $($field)*, "Operation failed");
    };
}
