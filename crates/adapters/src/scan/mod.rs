// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Malware scanner adapters.
//!
//! Each adapter drives one external command-line scanner and maps its
//! exit status and output patterns onto [`ScanVerdict`]. Invocation
//! failures and timeouts become `ScanVerdict::Error`, which the
//! orchestrator treats as retryable.

mod clamav;
mod defender;

pub use clamav::{ClamAvAdapter, CLAMAV};
pub use defender::{DefenderAdapter, DEFENDER};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeScanAdapter;

use async_trait::async_trait;
use shuttle_core::ScanVerdict;
use std::path::Path;
use std::time::Duration;

/// A malware scanner. Safe to call from multiple workers concurrently.
///
/// Object-safe so a run can mix scanner implementations in one set.
#[async_trait]
pub trait ScanAdapter: Send + Sync + 'static {
    /// Stable name used as the key in per-file scanner results.
    fn name(&self) -> &'static str;

    /// Scan one file within the given deadline.
    ///
    /// Never returns an error type: anything that prevents a verdict
    /// is folded into [`ScanVerdict::Error`].
    async fn scan(&self, path: &Path, timeout: Duration) -> ScanVerdict;
}
