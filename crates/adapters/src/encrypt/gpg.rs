// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GPG encryption over the `gpg` command line.

use super::{EncryptAdapter, EncryptError};
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Deadline for one encryption run. Hazard files are bounded by the
/// throttler's volume limits, so a fixed ceiling suffices.
const GPG_TIMEOUT: Duration = Duration::from_secs(600);

/// Encrypts with a recipient public key file, no keyring required.
#[derive(Debug, Clone)]
pub struct GpgEncryptAdapter {
    binary: PathBuf,
}

impl Default for GpgEncryptAdapter {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gpg"),
        }
    }
}

impl GpgEncryptAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl EncryptAdapter for GpgEncryptAdapter {
    async fn encrypt(
        &self,
        plain_path: &Path,
        cipher_path: &Path,
        public_key: &Path,
    ) -> Result<(), EncryptError> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(["--batch", "--yes", "--trust-model", "always"])
            .arg("--recipient-file")
            .arg(public_key)
            .arg("--output")
            .arg(cipher_path)
            .arg("--encrypt")
            .arg(plain_path);

        debug!(
            plain = %plain_path.display(),
            cipher = %cipher_path.display(),
            "gpg encrypt"
        );

        let result = run_with_timeout(cmd, GPG_TIMEOUT, "gpg encrypt").await;

        let failure = match result {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => EncryptError::Tool(format!(
                "gpg exit {:?}: {}",
                output.status.code(),
                output.stderr.trim(),
            )),
            Err(e) => EncryptError::Tool(e.to_string()),
        };

        // Never leave partial ciphertext behind
        if cipher_path.exists() {
            std::fs::remove_file(cipher_path)?;
        }
        Err(failure)
    }
}

#[cfg(test)]
#[path = "gpg_tests.rs"]
mod tests;
