// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake encryptor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{EncryptAdapter, EncryptError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded encryption call
#[derive(Debug, Clone)]
pub struct EncryptCall {
    pub plain_path: PathBuf,
    pub cipher_path: PathBuf,
    pub public_key: PathBuf,
}

struct FakeEncryptState {
    fail: bool,
    calls: Vec<EncryptCall>,
}

/// Fake encryptor: writes a marker ciphertext file, or fails without
/// producing one. Clones share state.
#[derive(Clone)]
pub struct FakeEncryptAdapter {
    inner: Arc<Mutex<FakeEncryptState>>,
}

impl Default for FakeEncryptAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeEncryptState {
                fail: false,
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeEncryptAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }

    pub fn calls(&self) -> Vec<EncryptCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl EncryptAdapter for FakeEncryptAdapter {
    async fn encrypt(
        &self,
        plain_path: &Path,
        cipher_path: &Path,
        public_key: &Path,
    ) -> Result<(), EncryptError> {
        let fail = {
            let mut state = self.inner.lock();
            state.calls.push(EncryptCall {
                plain_path: plain_path.to_path_buf(),
                cipher_path: cipher_path.to_path_buf(),
                public_key: public_key.to_path_buf(),
            });
            state.fail
        };

        if fail {
            return Err(EncryptError::Tool("fake encryption failure".to_string()));
        }

        if let Some(parent) = cipher_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(
            cipher_path,
            format!("fake-cipher of {}", plain_path.display()),
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
