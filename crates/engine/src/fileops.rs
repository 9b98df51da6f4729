// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem primitives for the pipeline.
//!
//! Copies are atomic (temp file + fsync + rename) and hashed in the
//! same pass, deletes are guarded by a content re-hash, and moves
//! verify by digest afterwards. Nothing here trusts a path to still
//! hold the bytes it held a moment ago.

use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Errors from file operations
#[derive(Debug, Error)]
pub enum FileOpsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("hash mismatch at {path}: expected {expected}, found {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Size + mtime signature used by the stability probe.
fn stat_signature(path: &Path) -> std::io::Result<(u64, SystemTime)> {
    let meta = fs::metadata(path)?;
    Ok((meta.len(), meta.modified()?))
}

/// Probe whether a source file has stopped changing.
///
/// Stable iff size and mtime hold across `samples` probes separated by
/// `probe_interval`, and no other process holds the file open for
/// write (checked via a non-blocking advisory lock). Any stat failure
/// means unstable, never an error — a vanishing file is simply not
/// ready.
pub async fn is_file_stable(path: &Path, probe_interval: Duration, samples: u32) -> bool {
    // Advisory probe: a writer holding the file locked fails this
    let Ok(file) = File::open(path) else {
        return false;
    };
    if file.try_lock_exclusive().is_err() {
        debug!(path = %path.display(), "file is locked by another process");
        return false;
    }
    let _ = fs2::FileExt::unlock(&file);
    drop(file);

    let Ok(first) = stat_signature(path) else {
        return false;
    };

    for _ in 1..samples.max(2) {
        tokio::time::sleep(probe_interval).await;
        match stat_signature(path) {
            Ok(sig) if sig == first => {}
            _ => return false,
        }
    }
    true
}

/// SHA-256 of a file's contents as lowercase hex.
pub fn hash_file(path: &Path) -> Result<String, FileOpsError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_digest(hasher))
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Copy `src` to `dst`, hashing the bytes as they stream through.
///
/// Writes to a temp file in the destination directory, fsyncs, then
/// renames into place; on any error the temp file is removed. The
/// destination is either absent or a complete file with the returned
/// digest.
pub fn copy_with_hash(src: &Path, dst: &Path) -> Result<(u64, String), FileOpsError> {
    let parent = dst.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    let basename = dst
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("shuttle");
    let tmp_path = parent.join(format!(".{basename}.{}.tmp", Uuid::new_v4()));

    let result = copy_into_temp(src, &tmp_path, dst);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn copy_into_temp(src: &Path, tmp_path: &Path, dst: &Path) -> Result<(u64, String), FileOpsError> {
    let mut reader = File::open(src)?;
    let mut writer = BufWriter::new(File::create(tmp_path)?);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut copied: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp_path, dst)?;
    Ok((copied, hex_digest(hasher)))
}

/// True iff both files hash to the same digest.
pub fn verify_equal_by_hash(a: &Path, b: &Path) -> Result<bool, FileOpsError> {
    Ok(hash_file(a)? == hash_file(b)?)
}

/// Move a file, falling back to copy + delete across filesystems.
pub fn atomic_move(src: &Path, dst: &Path) -> Result<(), FileOpsError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            debug!(src = %src.display(), dst = %dst.display(), "cross-device move, copying");
            copy_with_hash(src, dst)?;
            fs::remove_file(src)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a file only if its content still matches `expected_hash`.
///
/// Guards against deleting a source that was overwritten with new
/// content after it was quarantined.
pub fn safe_delete(path: &Path, expected_hash: &str) -> Result<(), FileOpsError> {
    let actual = hash_file(path)?;
    if actual != expected_hash {
        return Err(FileOpsError::HashMismatch {
            path: path.to_path_buf(),
            expected: expected_hash.to_string(),
            actual,
        });
    }
    fs::remove_file(path)?;
    Ok(())
}

/// Remove empty subdirectories below `root`, bottom-up. The root
/// itself is kept. Best-effort single pass: directories that gain
/// entries mid-walk are simply left for the next run.
pub fn prune_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;
    prune_below(root, &mut removed);
    removed
}

fn prune_below(dir: &Path, removed: &mut usize) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };

    let mut empty = true;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            if prune_below(&path, removed) && fs::remove_dir(&path).is_ok() {
                *removed += 1;
            } else {
                empty = false;
            }
        } else {
            empty = false;
        }
    }
    if !empty {
        debug!(dir = %dir.display(), "directory not empty after pass");
    }
    empty
}

/// Best-effort removal of a quarantine artifact, logging failures.
pub fn remove_quarantine_copy(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove quarantine copy");
        }
    }
}

#[cfg(test)]
#[path = "fileops_tests.rs"]
mod tests;
