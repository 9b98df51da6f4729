// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration errors. All are fatal at startup.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no config file given: pass --config or set ${0}")]
    NoConfigFile(&'static str),

    #[error("missing required key [{section}] {key}")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("[{section}] {key} must be an absolute path, got {path}")]
    RelativePath {
        section: &'static str,
        key: &'static str,
        path: PathBuf,
    },

    #[error("invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("no scanner enabled: set on_demand_defender and/or on_demand_clam_av")]
    NoScannerEnabled,

    #[error("max_scan_threads must be at least 1")]
    NoScanThreads,

    #[error("hazard_archive_path is set but hazard_encryption_key_path is not")]
    MissingHazardKey,
}
