// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with timeouts and bounded output capture.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Cap on captured stdout/stderr per stream. Scanner output beyond
/// this is discarded, not buffered.
pub const MAX_CAPTURE_BYTES: u64 = 64 * 1024;

/// Errors from running a subprocess
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{description} timed out after {}s", timeout.as_secs())]
    Timeout {
        description: String,
        timeout: Duration,
    },

    #[error("{description} failed: {source}")]
    Io {
        description: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

async fn read_capped<R>(reader: Option<R>) -> std::io::Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };
    let mut buf = Vec::new();
    (&mut reader).take(MAX_CAPTURE_BYTES).read_to_end(&mut buf).await?;
    // Keep draining so the child never blocks on a full pipe
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Run a subprocess with a hard deadline.
///
/// The child runs in its own process group and is killed when the
/// deadline elapses (kill-on-drop covers descendants of the direct
/// child exiting with it). Stdout and stderr are captured up to
/// [`MAX_CAPTURE_BYTES`] each.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<CommandOutput, SubprocessError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| SubprocessError::Io {
        description: description.to_string(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let wait = async {
        let (status, stdout, stderr) = tokio::try_join!(
            child.wait(),
            read_capped(stdout),
            read_capped(stderr),
        )?;
        Ok::<_, std::io::Error>((status, stdout, stderr))
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(Ok((status, stdout, stderr))) => Ok(CommandOutput {
            status,
            stdout,
            stderr,
        }),
        Ok(Err(source)) => Err(SubprocessError::Io {
            description: description.to_string(),
            source,
        }),
        Err(_elapsed) => {
            let _ = child.start_kill();
            Err(SubprocessError::Timeout {
                description: description.to_string(),
                timeout,
            })
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
