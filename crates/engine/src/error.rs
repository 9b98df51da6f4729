// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-run engine errors.
//!
//! Per-file failures never surface here; they end a file's trajectory
//! and land in the tracker as Failed records. Only conditions that
//! make the run itself impossible abort with one of these.

use crate::lock::LockError;
use shuttle_storage::{StateFileError, TrackerError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    StateFile(#[from] StateFileError),

    #[error("required directory {path} is unusable: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read source tree {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid run configuration: {0}")]
    Config(String),
}
