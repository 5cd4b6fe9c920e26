use tracing_subscriber::prelude::*;
use std::fs;
use std::path;

pub mod config;
pub mod common;
pub mod catalog;
pub mod storage;
pub mod transaction;
pub mod sql;
pub mod execution;

use common::{RsqlError, RsqlResult};

/// Install stdout and daily-rolling file logging.
/// `RUST_LOG` overrides the default level from `config`.
pub fn init_log() -> RsqlResult<()> {
    let log_path = path::Path::new(config::LOG_PATH);
    let (Some(log_dir), Some(log_filename)) = (log_path.parent(), log_path.file_name()) else {
        return Err(RsqlError::InvalidInput(format!("Invalid log path {}", config::LOG_PATH)));
    };
    fs::create_dir_all(log_dir)
        .map_err(|e| RsqlError::StorageError(format!("Failed to create log dir: {e}")))?;

    let stdout_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_thread_names(true)
        .with_level(true);

    let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    Box::leak(Box::new(_guard));

    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_thread_names(true)
        .with_level(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config::LOG_LEVEL));

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_log)
        .with(file_log)
        .try_init()
        .map_err(|e| RsqlError::ExecutionError(format!("Failed to install logger: {e}")))
}
