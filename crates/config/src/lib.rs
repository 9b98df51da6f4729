// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shuttle-config: layered run configuration.
//!
//! Settings come from a TOML file with INI-style sections
//! (`[paths] [settings] [scanning] [logging] [notifications]`),
//! overridden per key by `SHUTTLE_<SECTION>_<KEY>` environment
//! variables and then by CLI flags. Precedence: CLI > env > file >
//! built-in defaults.

pub mod error;
pub mod load;
pub mod schema;

pub use error::ConfigError;
pub use load::{Overrides, CONFIG_ENV_VAR};
pub use schema::{
    LogLevel, LoggingConfig, NotificationsConfig, PathsConfig, ScanningConfig, SettingsConfig,
    ShuttleConfig,
};
