// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ClamAV adapter over `clamdscan`.

use super::ScanAdapter;
use crate::subprocess::{run_with_timeout, SubprocessError};
use async_trait::async_trait;
use shuttle_core::{ScanErrorKind, ScanVerdict};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Scanner name used in per-file results.
pub const CLAMAV: &str = "clamav";

/// Drives `clamdscan`, which hands the file descriptor to the running
/// clamd daemon (`--fdpass`) so the scan works regardless of clamd's
/// own filesystem permissions.
#[derive(Debug, Clone)]
pub struct ClamAvAdapter {
    binary: PathBuf,
}

impl Default for ClamAvAdapter {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("clamdscan"),
        }
    }
}

impl ClamAvAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the scanner binary (tests, non-standard installs).
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ScanAdapter for ClamAvAdapter {
    fn name(&self) -> &'static str {
        CLAMAV
    }

    async fn scan(&self, path: &Path, timeout: Duration) -> ScanVerdict {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg("--fdpass").arg("--no-summary").arg(path);

        debug!(path = %path.display(), timeout_s = timeout.as_secs(), "clamav scan");

        match run_with_timeout(cmd, timeout, "clamdscan").await {
            Ok(output) => parse_output(output.status.code(), &output.stdout, &output.stderr),
            Err(SubprocessError::Timeout { .. }) => ScanVerdict::Error {
                kind: ScanErrorKind::Timeout,
                detail: format!("clamdscan exceeded {}s", timeout.as_secs()),
            },
            Err(e @ SubprocessError::Io { .. }) => ScanVerdict::Error {
                kind: ScanErrorKind::Launch,
                detail: e.to_string(),
            },
        }
    }
}

/// Map clamdscan's documented exit codes: 0 clean, 1 virus found,
/// 2 (and anything else) operational error.
fn parse_output(code: Option<i32>, stdout: &str, stderr: &str) -> ScanVerdict {
    match code {
        Some(0) => ScanVerdict::Clean,
        Some(1) => ScanVerdict::Threat {
            name: parse_threat_name(stdout)
                .unwrap_or_else(|| "unnamed threat reported by clamav".to_string()),
        },
        other => ScanVerdict::Error {
            kind: ScanErrorKind::Unrecognized,
            detail: format!(
                "clamdscan exit {:?}: {}",
                other,
                first_nonempty_line(stderr).unwrap_or_else(|| first_nonempty_line(stdout)
                    .unwrap_or_else(|| "no output".to_string())),
            ),
        },
    }
}

/// Extract the threat name from a `<path>: <Name> FOUND` report line.
fn parse_threat_name(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_suffix("FOUND") else {
            continue;
        };
        // Name sits between the last ": " and "FOUND"
        if let Some((_, name)) = rest.rsplit_once(": ") {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

fn first_nonempty_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "clamav_tests.rs"]
mod tests;
