// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config file loading and override layering.

use crate::error::ConfigError;
use crate::schema::{LogLevel, ShuttleConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SHUTTLE_CONFIG";

/// One override layer: every config key as an optional value.
///
/// Built from `SHUTTLE_<SECTION>_<KEY>` environment variables and from
/// CLI flags; applied in that order so CLI wins.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    // [paths]
    pub source_path: Option<PathBuf>,
    pub quarantine_path: Option<PathBuf>,
    pub destination_path: Option<PathBuf>,
    pub hazard_archive_path: Option<PathBuf>,
    pub hazard_encryption_key_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub tracking_data_path: Option<PathBuf>,
    pub ledger_file_path: Option<PathBuf>,

    // [settings]
    pub max_scan_threads: Option<usize>,
    pub delete_source_files_after_copying: Option<bool>,
    pub defender_handles_suspect_files: Option<bool>,
    pub on_demand_defender: Option<bool>,
    pub on_demand_clam_av: Option<bool>,
    pub throttle: Option<bool>,
    pub throttle_free_space_mb: Option<u64>,
    pub throttle_max_file_count_per_day: Option<u64>,
    pub throttle_max_file_volume_per_run_mb: Option<u64>,
    pub throttle_max_file_volume_per_day_mb: Option<u64>,

    // [scanning]
    pub malware_scan_timeout_seconds: Option<u64>,
    pub malware_scan_timeout_ms_per_byte: Option<f64>,
    pub malware_scan_retry_wait_seconds: Option<u64>,
    pub malware_scan_retry_count: Option<u32>,

    // [logging]
    pub log_level: Option<LogLevel>,

    // [notifications]
    pub notify: Option<bool>,
    pub notify_summary: Option<bool>,
    pub recipient_email: Option<String>,
    pub recipient_email_error: Option<String>,
    pub recipient_email_summary: Option<String>,
    pub recipient_email_hazard: Option<String>,
    pub sender_email: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: Option<bool>,
}

fn env_var(section: &str, key: &str) -> Option<String> {
    let name = format!(
        "SHUTTLE_{}_{}",
        section.to_ascii_uppercase(),
        key.to_ascii_uppercase()
    );
    std::env::var(&name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T>(section: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: format!("{section}.{key}"),
                value: raw,
                reason: e.to_string(),
            }),
    }
}

fn path_env(section: &str, key: &str) -> Option<PathBuf> {
    env_var(section, key).map(PathBuf::from)
}

impl Overrides {
    /// Collect overrides from `SHUTTLE_<SECTION>_<KEY>` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            source_path: path_env("paths", "source_path"),
            quarantine_path: path_env("paths", "quarantine_path"),
            destination_path: path_env("paths", "destination_path"),
            hazard_archive_path: path_env("paths", "hazard_archive_path"),
            hazard_encryption_key_path: path_env("paths", "hazard_encryption_key_path"),
            log_path: path_env("paths", "log_path"),
            tracking_data_path: path_env("paths", "tracking_data_path"),
            ledger_file_path: path_env("paths", "ledger_file_path"),

            max_scan_threads: parse_env("settings", "max_scan_threads")?,
            delete_source_files_after_copying: parse_env(
                "settings",
                "delete_source_files_after_copying",
            )?,
            defender_handles_suspect_files: parse_env(
                "settings",
                "defender_handles_suspect_files",
            )?,
            on_demand_defender: parse_env("settings", "on_demand_defender")?,
            on_demand_clam_av: parse_env("settings", "on_demand_clam_av")?,
            throttle: parse_env("settings", "throttle")?,
            throttle_free_space_mb: parse_env("settings", "throttle_free_space_mb")?,
            throttle_max_file_count_per_day: parse_env(
                "settings",
                "throttle_max_file_count_per_day",
            )?,
            throttle_max_file_volume_per_run_mb: parse_env(
                "settings",
                "throttle_max_file_volume_per_run_mb",
            )?,
            throttle_max_file_volume_per_day_mb: parse_env(
                "settings",
                "throttle_max_file_volume_per_day_mb",
            )?,

            malware_scan_timeout_seconds: parse_env("scanning", "malware_scan_timeout_seconds")?,
            malware_scan_timeout_ms_per_byte: parse_env(
                "scanning",
                "malware_scan_timeout_ms_per_byte",
            )?,
            malware_scan_retry_wait_seconds: parse_env(
                "scanning",
                "malware_scan_retry_wait_seconds",
            )?,
            malware_scan_retry_count: parse_env("scanning", "malware_scan_retry_count")?,

            log_level: parse_env("logging", "log_level")?,

            notify: parse_env("notifications", "notify")?,
            notify_summary: parse_env("notifications", "notify_summary")?,
            recipient_email: env_var("notifications", "recipient_email"),
            recipient_email_error: env_var("notifications", "recipient_email_error"),
            recipient_email_summary: env_var("notifications", "recipient_email_summary"),
            recipient_email_hazard: env_var("notifications", "recipient_email_hazard"),
            sender_email: env_var("notifications", "sender_email"),
            smtp_server: env_var("notifications", "smtp_server"),
            smtp_port: parse_env("notifications", "smtp_port")?,
            username: env_var("notifications", "username"),
            password: env_var("notifications", "password"),
            use_tls: parse_env("notifications", "use_tls")?,
        })
    }
}

impl ShuttleConfig {
    /// Parse a TOML config file. Unknown keys are rejected.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Apply one override layer in place. `None` fields leave the
    /// current value untouched.
    pub fn apply(&mut self, overrides: &Overrides) {
        macro_rules! set {
            ($section:ident, $($key:ident),+ $(,)?) => {
                $(if let Some(v) = overrides.$key.clone() {
                    self.$section.$key = v.into();
                })+
            };
        }
        // Path/string keys are themselves Options in the schema, so a
        // set override wraps into Some via `into`.
        set!(
            paths,
            source_path,
            quarantine_path,
            destination_path,
            hazard_archive_path,
            hazard_encryption_key_path,
            log_path,
            tracking_data_path,
            ledger_file_path,
        );
        set!(
            settings,
            max_scan_threads,
            delete_source_files_after_copying,
            defender_handles_suspect_files,
            on_demand_defender,
            on_demand_clam_av,
            throttle,
            throttle_free_space_mb,
            throttle_max_file_count_per_day,
            throttle_max_file_volume_per_run_mb,
            throttle_max_file_volume_per_day_mb,
        );
        set!(
            scanning,
            malware_scan_timeout_seconds,
            malware_scan_timeout_ms_per_byte,
            malware_scan_retry_wait_seconds,
            malware_scan_retry_count,
        );
        set!(logging, log_level);
        set!(
            notifications,
            notify,
            notify_summary,
            recipient_email,
            recipient_email_error,
            recipient_email_summary,
            recipient_email_hazard,
            sender_email,
            smtp_server,
            smtp_port,
            username,
            password,
            use_tls,
        );
    }

    /// Resolve the full layered configuration.
    ///
    /// `config_path` comes from the CLI; when absent, `$SHUTTLE_CONFIG`
    /// names the file. Defaults apply when neither is set and
    /// `require_file` is false.
    pub fn resolve(
        config_path: Option<&Path>,
        cli: &Overrides,
        require_file: bool,
    ) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        let file = config_path.map(Path::to_path_buf).or(env_path);

        let mut config = match file {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None if require_file => return Err(ConfigError::NoConfigFile(CONFIG_ENV_VAR)),
            None => Self::default(),
        };

        config.apply(&Overrides::from_env()?);
        config.apply(cli);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
