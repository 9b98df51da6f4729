// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance lock.
//!
//! A PID-bearing lock file held under an exclusive, non-blocking OS
//! file lock for the whole run. The OS releases the lock when the
//! process dies, so a crashed run never wedges the scheduler; a lock
//! file whose recorded PID is dead is explicitly taken over.

use chrono::{DateTime, Local};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Lock acquisition errors
#[derive(Debug, Error)]
pub enum LockError {
    #[error("another shuttle instance holds the lock (pid {0:?})")]
    AlreadyRunning(Option<u32>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Held instance lock. Released (and the lock file removed) on drop.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock exclusively, taking over stale locks whose
    /// recorded PID is no longer alive.
    pub fn acquire(path: &Path, started_at: DateTime<Local>) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::try_acquire(path, started_at, true)
    }

    fn try_acquire(
        path: &Path,
        started_at: DateTime<Local>,
        allow_stale_takeover: bool,
    ) -> Result<Self, LockError> {
        // Open without truncating so a failed attempt never wipes the
        // running instance's PID.
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            let holder = read_holder_pid(path);
            match holder {
                Some(pid) if pid_alive(pid) => {
                    return Err(LockError::AlreadyRunning(Some(pid)));
                }
                _ if allow_stale_takeover => {
                    warn!(
                        path = %path.display(),
                        stale_pid = ?holder,
                        "lock file held by a dead process, taking over"
                    );
                    let _ = fs::remove_file(path);
                    return Self::try_acquire(path, started_at, false);
                }
                _ => return Err(LockError::AlreadyRunning(holder)),
            }
        }

        // Record holder identity now that the lock is ours
        file.set_len(0)?;
        writeln!(
            file,
            "{} {}",
            std::process::id(),
            started_at.format("%Y-%m-%dT%H:%M:%S%z")
        )?;
        file.sync_all()?;

        info!(path = %path.display(), pid = std::process::id(), "instance lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Explicit release; equivalent to drop.
    pub fn release(self) {}
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.path);
    }
}

/// First whitespace-delimited token of the lock file is the holder PID.
fn read_holder_pid(path: &Path) -> Option<u32> {
    let contents = fs::read_to_string(path).ok()?;
    contents.split_whitespace().next()?.parse().ok()
}

#[cfg(target_os = "linux")]
fn pid_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn pid_alive(_pid: u32) -> bool {
    // Without a portable liveness probe, assume the holder is alive
    true
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
