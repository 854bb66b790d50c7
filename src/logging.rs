//! Logging initialization.
//!
//! Stdout and stderr carry the proxied command, so logs go to a file instead:
//! `<data dir>/snappet-cli/logs/snappet-cli.<YYYY-MM-DD>.log`, one file per day.
//! Only the newest [`MAX_LOG_FILES`] files are kept; older ones are pruned
//! when logging starts.
//!
//! The level comes from `RUST_LOG`, defaulting to `info` (`debug` with `--verbose`).

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "snappet-cli";
const LOG_FILE_SUFFIX: &str = "log";
const MAX_LOG_FILES: usize = 7;

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("snappet-cli").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Daily log file in `dir`, pruning all but the newest [`MAX_LOG_FILES`].
fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}

/// Initialize file logging.
///
/// Returns the writer guard; dropping it flushes pending log lines. Returns
/// `None` (after a one-line warning) if the log file cannot be created.
pub fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let log_dir = log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        return None;
    }

    let appender = match file_appender(&log_dir) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        return None;
    }

    tracing::info!("Logging initialized - writing to {}", log_dir.display());
    Some(guard)
}
