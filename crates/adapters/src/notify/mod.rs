// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters.
//!
//! Notifications are best-effort: callers log failures and move on; a
//! broken mail relay never influences file processing.

mod noop;
mod smtp;

pub use noop::NoopNotifyAdapter;
pub use smtp::{SmtpNotifyAdapter, SmtpSettings};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Notification severity, used for subject lines and recipient routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Adapter for sending notifications
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Send a notification. `topic` is a short machine-friendly tag
    /// ("summary", "hazard", "throttle", ...); `body` is free text.
    async fn notify(&self, severity: Severity, topic: &str, body: &str)
        -> Result<(), NotifyError>;
}
