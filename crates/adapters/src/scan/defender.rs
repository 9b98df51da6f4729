// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Microsoft Defender adapter over `mdatp`.

use super::ScanAdapter;
use crate::subprocess::{run_with_timeout, SubprocessError};
use async_trait::async_trait;
use shuttle_core::{ScanErrorKind, ScanVerdict};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Scanner name used in per-file results.
pub const DEFENDER: &str = "defender";

/// Drives `mdatp scan custom` against a single quarantined file.
///
/// `--ignore-exclusions` makes the verdict independent of any host
/// exclusion list covering the quarantine tree.
#[derive(Debug, Clone)]
pub struct DefenderAdapter {
    binary: PathBuf,
}

impl Default for DefenderAdapter {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("mdatp"),
        }
    }
}

impl DefenderAdapter {
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
impl ScanAdapter for DefenderAdapter {
    fn name(&self) -> &'static str {
        DEFENDER
    }

    async fn scan(&self, path: &Path, timeout: Duration) -> ScanVerdict {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(["scan", "custom", "--ignore-exclusions", "--path"])
            .arg(path);

        debug!(path = %path.display(), timeout_s = timeout.as_secs(), "defender scan");

        match run_with_timeout(cmd, timeout, "mdatp scan").await {
            Ok(output) => parse_output(output.status.code(), &output.stdout, &output.stderr),
            Err(SubprocessError::Timeout { .. }) => ScanVerdict::Error {
                kind: ScanErrorKind::Timeout,
                detail: format!("mdatp scan exceeded {}s", timeout.as_secs()),
            },
            Err(e @ SubprocessError::Io { .. }) => ScanVerdict::Error {
                kind: ScanErrorKind::Launch,
                detail: e.to_string(),
            },
        }
    }
}

/// `mdatp scan custom` reports `"\t N threat(s) detected"` on success.
/// Anything without that marker is unrecognized output, not a verdict.
fn parse_output(code: Option<i32>, stdout: &str, stderr: &str) -> ScanVerdict {
    match (code, parse_threat_count(stdout)) {
        (Some(0), Some(0)) => ScanVerdict::Clean,
        (Some(_), Some(n)) if n > 0 => ScanVerdict::Threat {
            name: format!("{n} threat(s) detected by defender"),
        },
        // Exit 0 with an unparseable report, or a failure exit
        (code, _) => ScanVerdict::Error {
            kind: ScanErrorKind::Unrecognized,
            detail: format!(
                "mdatp exit {:?}: {}",
                code,
                stderr
                    .lines()
                    .chain(stdout.lines())
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .unwrap_or("no output"),
            ),
        },
    }
}

/// Extract N from the `"N threat(s) detected"` report line.
fn parse_threat_count(stdout: &str) -> Option<u32> {
    for line in stdout.lines() {
        let line = line.trim();
        if let Some(prefix) = line.strip_suffix("threat(s) detected") {
            if let Ok(n) = prefix.trim().parse::<u32>() {
                return Some(n);
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "defender_tests.rs"]
mod tests;
