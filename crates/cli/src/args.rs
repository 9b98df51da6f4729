// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments. Every config key has a flag; flags are the
//! top override layer (CLI > env > config file > defaults).

use clap::Parser;
use shuttle_config::{ConfigError, LogLevel, Overrides};
use std::path::PathBuf;

/// Unattended antivirus gatekeeper: quarantine, scan, deliver.
#[derive(Debug, Parser)]
#[command(name = "shuttle", version, about)]
pub struct CliArgs {
    /// Config file path (overrides $SHUTTLE_CONFIG)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // [paths]
    #[arg(long, value_name = "DIR")]
    pub source_path: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    pub quarantine_path: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    pub destination_path: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    pub hazard_archive_path: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub hazard_encryption_key_path: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub log_path: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    pub tracking_data_path: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub ledger_file_path: Option<PathBuf>,

    // [settings]
    #[arg(long, value_name = "N")]
    pub max_scan_threads: Option<usize>,
    #[arg(long, value_name = "BOOL")]
    pub delete_source_files_after_copying: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub defender_handles_suspect_files: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub on_demand_defender: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub on_demand_clam_av: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub throttle: Option<bool>,
    #[arg(long, value_name = "MB")]
    pub throttle_free_space_mb: Option<u64>,
    #[arg(long, value_name = "N")]
    pub throttle_max_file_count_per_day: Option<u64>,
    #[arg(long, value_name = "MB")]
    pub throttle_max_file_volume_per_run_mb: Option<u64>,
    #[arg(long, value_name = "MB")]
    pub throttle_max_file_volume_per_day_mb: Option<u64>,

    // [scanning]
    #[arg(long, value_name = "SECONDS")]
    pub malware_scan_timeout_seconds: Option<u64>,
    #[arg(long, value_name = "MS")]
    pub malware_scan_timeout_ms_per_byte: Option<f64>,
    #[arg(long, value_name = "SECONDS")]
    pub malware_scan_retry_wait_seconds: Option<u64>,
    #[arg(long, value_name = "N")]
    pub malware_scan_retry_count: Option<u32>,

    // [logging]
    /// DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    // [notifications]
    #[arg(long, value_name = "BOOL")]
    pub notify: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub notify_summary: Option<bool>,
    #[arg(long, value_name = "EMAIL")]
    pub recipient_email: Option<String>,
    #[arg(long, value_name = "EMAIL")]
    pub recipient_email_error: Option<String>,
    #[arg(long, value_name = "EMAIL")]
    pub recipient_email_summary: Option<String>,
    #[arg(long, value_name = "EMAIL")]
    pub recipient_email_hazard: Option<String>,
    #[arg(long, value_name = "EMAIL")]
    pub sender_email: Option<String>,
    #[arg(long, value_name = "HOST")]
    pub smtp_server: Option<String>,
    #[arg(long, value_name = "PORT")]
    pub smtp_port: Option<u16>,
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,
    #[arg(long, value_name = "BOOL")]
    pub use_tls: Option<bool>,
}

impl CliArgs {
    /// Map flags onto the config override layer.
    pub fn overrides(&self) -> Result<Overrides, ConfigError> {
        let log_level: Option<LogLevel> = match &self.log_level {
            None => None,
            Some(raw) => Some(raw.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "logging.log_level".to_string(),
                value: raw.clone(),
                reason,
            })?),
        };

        Ok(Overrides {
            source_path: self.source_path.clone(),
            quarantine_path: self.quarantine_path.clone(),
            destination_path: self.destination_path.clone(),
            hazard_archive_path: self.hazard_archive_path.clone(),
            hazard_encryption_key_path: self.hazard_encryption_key_path.clone(),
            log_path: self.log_path.clone(),
            tracking_data_path: self.tracking_data_path.clone(),
            ledger_file_path: self.ledger_file_path.clone(),

            max_scan_threads: self.max_scan_threads,
            delete_source_files_after_copying: self.delete_source_files_after_copying,
            defender_handles_suspect_files: self.defender_handles_suspect_files,
            on_demand_defender: self.on_demand_defender,
            on_demand_clam_av: self.on_demand_clam_av,
            throttle: self.throttle,
            throttle_free_space_mb: self.throttle_free_space_mb,
            throttle_max_file_count_per_day: self.throttle_max_file_count_per_day,
            throttle_max_file_volume_per_run_mb: self.throttle_max_file_volume_per_run_mb,
            throttle_max_file_volume_per_day_mb: self.throttle_max_file_volume_per_day_mb,

            malware_scan_timeout_seconds: self.malware_scan_timeout_seconds,
            malware_scan_timeout_ms_per_byte: self.malware_scan_timeout_ms_per_byte,
            malware_scan_retry_wait_seconds: self.malware_scan_retry_wait_seconds,
            malware_scan_retry_count: self.malware_scan_retry_count,

            log_level,

            notify: self.notify,
            notify_summary: self.notify_summary,
            recipient_email: self.recipient_email.clone(),
            recipient_email_error: self.recipient_email_error.clone(),
            recipient_email_summary: self.recipient_email_summary.clone(),
            recipient_email_hazard: self.recipient_email_hazard.clone(),
            sender_email: self.sender_email.clone(),
            smtp_server: self.smtp_server.clone(),
            smtp_port: self.smtp_port,
            username: self.username.clone(),
            password: self.password.clone(),
            use_tls: self.use_tls,
        })
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
