// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration schema: sections, keys, defaults, validation.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete run configuration.
///
/// Unknown keys in any section are rejected at parse time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShuttleConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub scanning: ScanningConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// `[paths]` — directory and file locations. All paths are absolute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Untrusted inbound tree
    pub source_path: Option<PathBuf>,
    /// Staging tree; every candidate is copied and hashed here first
    pub quarantine_path: Option<PathBuf>,
    /// Trusted outbound tree; only clean files land here
    pub destination_path: Option<PathBuf>,
    /// Encrypted at-rest storage for suspect files
    pub hazard_archive_path: Option<PathBuf>,
    /// GPG public key used to encrypt hazard files
    pub hazard_encryption_key_path: Option<PathBuf>,
    /// Engine log file
    pub log_path: Option<PathBuf>,
    /// Daily tracker state directory; defaults to the log directory
    pub tracking_data_path: Option<PathBuf>,
    /// Scanner-version ledger used by an adjunct tool; recognised but
    /// not read by the engine
    pub ledger_file_path: Option<PathBuf>,
}

impl PathsConfig {
    /// Directory holding tracker day files and the instance lock.
    pub fn tracking_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.tracking_data_path {
            return Some(dir.clone());
        }
        self.log_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    }
}

/// `[settings]` — pipeline behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SettingsConfig {
    /// Scan worker pool size (>= 1)
    pub max_scan_threads: usize,
    /// Remove source files after a clean copy or suspect archival
    pub delete_source_files_after_copying: bool,
    /// Trust Defender to quarantine threats it finds itself
    pub defender_handles_suspect_files: bool,
    /// Scanner set; at least one must be enabled
    pub on_demand_defender: bool,
    pub on_demand_clam_av: bool,
    /// Master switch for admission throttling
    pub throttle: bool,
    /// Minimum free space left after admitting a file, per directory
    pub throttle_free_space_mb: u64,
    /// Daily file-count cap (0 = unlimited)
    pub throttle_max_file_count_per_day: u64,
    /// Per-run volume cap in MB (0 = unlimited)
    pub throttle_max_file_volume_per_run_mb: u64,
    /// Daily volume cap in MB (0 = unlimited)
    pub throttle_max_file_volume_per_day_mb: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            max_scan_threads: 1,
            delete_source_files_after_copying: false,
            defender_handles_suspect_files: false,
            on_demand_defender: false,
            on_demand_clam_av: false,
            throttle: false,
            throttle_free_space_mb: 100,
            throttle_max_file_count_per_day: 0,
            throttle_max_file_volume_per_run_mb: 0,
            throttle_max_file_volume_per_day_mb: 0,
        }
    }
}

/// `[scanning]` — per-invocation scan bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScanningConfig {
    /// Base timeout per scanner invocation
    pub malware_scan_timeout_seconds: u64,
    /// Size-proportional timeout extension
    pub malware_scan_timeout_ms_per_byte: f64,
    /// Backoff between retries of an errored scan
    pub malware_scan_retry_wait_seconds: u64,
    /// Retries after the first errored attempt
    pub malware_scan_retry_count: u32,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            malware_scan_timeout_seconds: 300,
            malware_scan_timeout_ms_per_byte: 0.0,
            malware_scan_retry_wait_seconds: 30,
            malware_scan_retry_count: 3,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub log_level: LogLevel,
}

/// Log verbosity, spelled the way operators expect from the scheduler
/// environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "DEBUG")]
    Debug,
    #[default]
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl LogLevel {
    /// Directive string for the tracing env-filter.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            // tracing has no level above error
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// `[notifications]` — delivered verbatim to the SMTP notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NotificationsConfig {
    /// Send error/hazard/throttle notifications
    pub notify: bool,
    /// Send the end-of-run summary
    pub notify_summary: bool,
    pub recipient_email: Option<String>,
    pub recipient_email_error: Option<String>,
    pub recipient_email_summary: Option<String>,
    pub recipient_email_hazard: Option<String>,
    pub sender_email: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            notify: false,
            notify_summary: false,
            recipient_email: None,
            recipient_email_error: None,
            recipient_email_summary: None,
            recipient_email_hazard: None,
            sender_email: None,
            smtp_server: None,
            smtp_port: 25,
            username: None,
            password: None,
            use_tls: false,
        }
    }
}

impl ShuttleConfig {
    /// Check cross-key invariants after all override layers applied.
    ///
    /// Directory existence and writability are the driver's concern at
    /// startup; this validates shape only.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("source_path", &self.paths.source_path),
            ("quarantine_path", &self.paths.quarantine_path),
            ("destination_path", &self.paths.destination_path),
            ("log_path", &self.paths.log_path),
        ] {
            let Some(path) = value else {
                return Err(ConfigError::MissingKey {
                    section: "paths",
                    key,
                });
            };
            if !path.is_absolute() {
                return Err(ConfigError::RelativePath {
                    section: "paths",
                    key,
                    path: path.clone(),
                });
            }
        }

        for (key, value) in [
            ("hazard_archive_path", &self.paths.hazard_archive_path),
            (
                "hazard_encryption_key_path",
                &self.paths.hazard_encryption_key_path,
            ),
            ("tracking_data_path", &self.paths.tracking_data_path),
        ] {
            if let Some(path) = value {
                if !path.is_absolute() {
                    return Err(ConfigError::RelativePath {
                        section: "paths",
                        key,
                        path: path.clone(),
                    });
                }
            }
        }

        if self.paths.hazard_archive_path.is_some()
            && self.paths.hazard_encryption_key_path.is_none()
        {
            return Err(ConfigError::MissingHazardKey);
        }

        if !self.settings.on_demand_defender && !self.settings.on_demand_clam_av {
            return Err(ConfigError::NoScannerEnabled);
        }

        if self.settings.max_scan_threads == 0 {
            return Err(ConfigError::NoScanThreads);
        }

        if self.scanning.malware_scan_timeout_ms_per_byte < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "malware_scan_timeout_ms_per_byte".to_string(),
                value: self.scanning.malware_scan_timeout_ms_per_byte.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
