// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run configuration for the engine, mapped from the loaded settings.

use crate::disposition::HazardConfig;
use crate::error::EngineError;
use crate::orchestrator::ScanLimits;
use crate::throttle::ThrottleConfig;
use shuttle_config::ShuttleConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Source-file stability probing parameters.
#[derive(Debug, Clone)]
pub struct StabilityConfig {
    pub probe_interval: Duration,
    pub samples: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_millis(250),
            samples: 2,
        }
    }
}

/// Everything the pipeline driver needs for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_root: PathBuf,
    pub quarantine_root: PathBuf,
    pub destination_root: PathBuf,
    pub hazard: Option<HazardConfig>,
    /// Day state files and the instance lock live here
    pub tracking_dir: PathBuf,
    pub lock_path: PathBuf,
    pub delete_source_files: bool,
    pub defender_handles_suspect_files: bool,
    pub max_scan_threads: usize,
    pub throttle: ThrottleConfig,
    pub scan_limits: ScanLimits,
    pub stability: StabilityConfig,
    pub notify: bool,
    pub notify_summary: bool,
}

impl RunConfig {
    /// Map validated settings into a run configuration.
    pub fn from_settings(config: &ShuttleConfig) -> Result<Self, EngineError> {
        let require = |key: &str, value: &Option<PathBuf>| {
            value
                .clone()
                .ok_or_else(|| EngineError::Config(format!("missing paths.{key}")))
        };

        let source_root = require("source_path", &config.paths.source_path)?;
        let quarantine_root = require("quarantine_path", &config.paths.quarantine_path)?;
        let destination_root = require("destination_path", &config.paths.destination_path)?;
        let tracking_dir = config
            .paths
            .tracking_dir()
            .ok_or_else(|| EngineError::Config("no tracking directory derivable".to_string()))?;

        let hazard = match &config.paths.hazard_archive_path {
            Some(archive_root) => {
                let public_key = require(
                    "hazard_encryption_key_path",
                    &config.paths.hazard_encryption_key_path,
                )?;
                Some(HazardConfig {
                    archive_root: archive_root.clone(),
                    public_key,
                })
            }
            None => None,
        };

        let settings = &config.settings;
        let scanning = &config.scanning;

        Ok(Self {
            lock_path: tracking_dir.join("shuttle.pid"),
            source_root,
            quarantine_root,
            destination_root,
            hazard,
            tracking_dir,
            delete_source_files: settings.delete_source_files_after_copying,
            defender_handles_suspect_files: settings.defender_handles_suspect_files,
            max_scan_threads: settings.max_scan_threads.max(1),
            throttle: ThrottleConfig {
                enabled: settings.throttle,
                min_free_mb: settings.throttle_free_space_mb,
                max_files_per_day: settings.throttle_max_file_count_per_day,
                max_volume_mb_per_day: settings.throttle_max_file_volume_per_day_mb,
                max_volume_mb_per_run: settings.throttle_max_file_volume_per_run_mb,
            },
            scan_limits: ScanLimits {
                base_timeout: Duration::from_secs(scanning.malware_scan_timeout_seconds),
                timeout_ms_per_byte: scanning.malware_scan_timeout_ms_per_byte,
                retry_wait: Duration::from_secs(scanning.malware_scan_retry_wait_seconds),
                retry_count: scanning.malware_scan_retry_count,
            },
            stability: StabilityConfig::default(),
            notify: config.notifications.notify,
            notify_summary: config.notifications.notify_summary,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
