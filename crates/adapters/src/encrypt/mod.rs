// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hazard-file encryption adapters.

mod gpg;

pub use gpg::GpgEncryptAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{EncryptCall, FakeEncryptAdapter};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from encryption operations
#[derive(Debug, Error)]
pub enum EncryptError {
    #[error("encryption tool failed: {0}")]
    Tool(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Public-key encryption of a suspect file.
///
/// Contract: on error the cipher path is absent — a failed run never
/// leaves partial ciphertext that could be mistaken for an archive.
#[async_trait]
pub trait EncryptAdapter: Clone + Send + Sync + 'static {
    async fn encrypt(
        &self,
        plain_path: &Path,
        cipher_path: &Path,
        public_key: &Path,
    ) -> Result<(), EncryptError>;
}
