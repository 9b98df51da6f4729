// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notification adapter for runs with notifications disabled.

use super::{NotifyAdapter, NotifyError, Severity};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifyAdapter;

impl NoopNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for NoopNotifyAdapter {
    async fn notify(
        &self,
        severity: Severity,
        topic: &str,
        _body: &str,
    ) -> Result<(), NotifyError> {
        debug!(%severity, topic, "notification suppressed (notifications disabled)");
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
