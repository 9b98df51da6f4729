// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared shutdown flag.
//!
//! Signal handlers set it; the driver stops admitting new files and
//! scan workers stop taking jobs. In-flight scans run to completion or
//! their timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

/// Clonable shutdown flag shared by the driver, workers, and signal
/// handlers.
#[derive(Clone)]
pub struct ShutdownFlag {
    inner: Arc<Inner>,
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                flag: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent.
    pub fn set(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_set(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a set between check and await
            // is not lost
            let notified = self.inner.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
