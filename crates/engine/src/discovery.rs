// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate discovery under the source tree.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One file found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Path relative to the source root; mirrored into quarantine and
    /// destination
    pub rel_path: PathBuf,
    pub size_bytes: u64,
}

/// Recursively list regular files under `source_root`, ordered
/// lexicographically by path so runs are reproducible.
///
/// Symlinks are skipped: a link pointing outside the source tree must
/// not pull foreign content through the pipeline. Per-entry errors are
/// logged and skipped; only an unreadable root is an error.
pub fn discover(source_root: &Path) -> std::io::Result<Vec<Candidate>> {
    let mut found = Vec::new();
    walk(source_root, source_root, &mut found)?;
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

fn walk(root: &Path, dir: &Path, found: &mut Vec<Candidate>) -> std::io::Result<()> {
    let entries = std::fs::read_dir(dir)?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            warn!(path = %path.display(), "cannot stat entry, skipping");
            continue;
        };

        if file_type.is_symlink() {
            debug!(path = %path.display(), "skipping symlink");
            continue;
        }

        if file_type.is_dir() {
            if let Err(e) = walk(root, &path, found) {
                warn!(dir = %path.display(), error = %e, "skipping unreadable directory");
            }
            continue;
        }

        if !file_type.is_file() {
            debug!(path = %path.display(), "skipping non-regular file");
            continue;
        }

        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat file, skipping");
                continue;
            }
        };

        let rel_path = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());

        found.push(Candidate {
            path,
            rel_path,
            size_bytes,
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
