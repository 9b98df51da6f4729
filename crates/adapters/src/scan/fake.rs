// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake scanner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::ScanAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use shuttle_core::{ScanErrorKind, ScanVerdict};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

struct FakeScanState {
    default_verdict: ScanVerdict,
    /// Per-path verdict scripts; successive calls pop from the front,
    /// the last entry repeats
    scripts: HashMap<PathBuf, Vec<ScanVerdict>>,
    delay: Duration,
    /// Emulate Defender self-quarantine: remove the file when
    /// reporting a Threat
    remove_on_threat: bool,
    calls: Vec<PathBuf>,
}

/// Scriptable scanner for tests. Clones share state.
#[derive(Clone)]
pub struct FakeScanAdapter {
    name: &'static str,
    inner: Arc<Mutex<FakeScanState>>,
}

impl FakeScanAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(FakeScanState {
                default_verdict: ScanVerdict::Clean,
                scripts: HashMap::new(),
                delay: Duration::ZERO,
                remove_on_threat: false,
                calls: Vec::new(),
            })),
        }
    }

    /// Verdict returned for paths without a script.
    pub fn set_default(&self, verdict: ScanVerdict) {
        self.inner.lock().default_verdict = verdict;
    }

    /// Queue verdicts for one path; the last verdict repeats once the
    /// script is exhausted.
    pub fn script(&self, path: impl Into<PathBuf>, verdicts: Vec<ScanVerdict>) {
        self.inner.lock().scripts.insert(path.into(), verdicts);
    }

    /// Artificial scan latency. If the latency exceeds the caller's
    /// deadline the fake reports a timeout error, like a real adapter.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = delay;
    }

    pub fn set_remove_on_threat(&self, remove: bool) {
        self.inner.lock().remove_on_threat = remove;
    }

    /// All paths scanned, in order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    fn next_verdict(&self, path: &Path) -> ScanVerdict {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        state.calls.push(path.to_path_buf());
        match state.scripts.get_mut(path) {
            Some(script) if script.len() > 1 => script.remove(0),
            Some(script) => script
                .first()
                .cloned()
                .unwrap_or_else(|| state.default_verdict.clone()),
            None => state.default_verdict.clone(),
        }
    }
}

#[async_trait]
impl ScanAdapter for FakeScanAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn scan(&self, path: &Path, timeout: Duration) -> ScanVerdict {
        let (delay, remove_on_threat) = {
            let state = self.inner.lock();
            (state.delay, state.remove_on_threat)
        };

        if delay > timeout {
            tokio::time::sleep(timeout).await;
            // Still consumes the scripted verdict so retries progress
            let _ = self.next_verdict(path);
            return ScanVerdict::Error {
                kind: ScanErrorKind::Timeout,
                detail: format!("fake scan exceeded {}s", timeout.as_secs()),
            };
        }
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        let verdict = self.next_verdict(path);
        if remove_on_threat && verdict.is_threat() {
            let _ = std::fs::remove_file(path);
        }
        verdict
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
