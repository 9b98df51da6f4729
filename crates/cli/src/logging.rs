// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging bootstrap: non-blocking file appender with startup
//! size-based rotation.

use anyhow::Context;
use shuttle_config::ShuttleConfig;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (shuttle.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Set up tracing to the configured log file. The returned guard must
/// live until exit so buffered lines flush.
pub fn init(
    config: &ShuttleConfig,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(log_path) = &config.paths.log_path else {
        // No log file configured (flag-driven smoke runs): stderr only
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.logging.log_level.as_filter()));
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let parent = log_path
        .parent()
        .context("log_path has no parent directory")?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("cannot create log directory {}", parent.display()))?;

    rotate_log_if_needed(log_path);

    let file_name = log_path.file_name().context("log_path has no file name")?;
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG (when set) wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.log_level.as_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(Some(guard))
}

/// Rotate the log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `shuttle.log` → `shuttle.log.1` → `.2` → `.3`, deleting the
/// oldest. Best-effort: rotation failures never block a run.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
