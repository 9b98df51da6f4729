// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-day state files.
//!
//! One JSON file per local calendar day, named `YYYY-MM-DD.state`.
//! Saves are atomic (temp file + fsync + rename) so a crash never
//! leaves a partially written snapshot. An unreadable file is rotated
//! to `.bak` and the day restarts empty rather than aborting the run.

use crate::state::DayState;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors from day-file persistence
#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Path of the state file for a given day.
pub fn state_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{date}.state"))
}

/// Enumerate `(date, path)` for every day file in the directory.
pub fn list_day_files(dir: &Path) -> Result<Vec<(NaiveDate, PathBuf)>, StateFileError> {
    let mut found = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("state") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Ok(date) = stem.parse::<NaiveDate>() {
            found.push((date, path));
        }
    }

    found.sort_by_key(|(date, _)| *date);
    Ok(found)
}

/// Save a day state atomically (write to .tmp, fsync, then rename).
pub fn save(state: &DayState, path: &Path) -> Result<(), StateFileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");

    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load a day state if the file exists.
///
/// Returns `Ok(None)` when the file is absent or corrupt. Corrupt
/// files are moved to a `.bak` path so the day can restart empty while
/// keeping the evidence around.
pub fn load(path: &Path) -> Result<Option<DayState>, StateFileError> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    match serde_json::from_reader(reader) {
        Ok(state) => Ok(Some(state)),
        Err(e) => {
            let bak_path = rotate_bak_path(path);
            warn!(
                error = %e,
                path = %path.display(),
                bak = %bak_path.display(),
                "Corrupt day state file, moving to .bak and starting the day empty",
            );
            fs::rename(path, &bak_path)?;
            Ok(None)
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "day_file_tests.rs"]
mod tests;
