// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError, Severity};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded notification
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub severity: Severity,
    pub topic: String,
    pub body: String,
}

struct FakeNotifyState {
    fail: bool,
    calls: Vec<NotifyCall>,
}

/// Fake notification adapter for testing. Clones share state.
#[derive(Clone)]
pub struct FakeNotifyAdapter {
    inner: Arc<Mutex<FakeNotifyState>>,
}

impl Default for FakeNotifyAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeNotifyState {
                fail: false,
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded notifications matching a topic
    pub fn calls_for_topic(&self, topic: &str) -> Vec<NotifyCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(
        &self,
        severity: Severity,
        topic: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let mut state = self.inner.lock();
        state.calls.push(NotifyCall {
            severity,
            topic: topic.to_string(),
            body: body.to_string(),
        });
        if state.fail {
            return Err(NotifyError::SendFailed("fake notifier failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
