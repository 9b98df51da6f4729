// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome-specific effects after scanning.
//!
//! Clean files move to the destination (verified by hash). Suspect
//! files are encrypted into the hazard archive, or verified gone when
//! the scanner quarantines threats itself. Failed files stay in
//! quarantine for post-mortem. Source copies are removed only behind
//! the hash guard, and only when source deletion is enabled.

use crate::fileops::{self, FileOpsError};
use crate::orchestrator::ScanJob;
use shuttle_adapters::scan::DEFENDER;
use shuttle_adapters::EncryptAdapter;
use shuttle_core::{Clock, FileOutcome, FileVerdict, ScanVerdict, ScannerResults};
use std::path::PathBuf;
use tracing::{info, warn};

/// Hazard archive location and the public key that seals it.
#[derive(Debug, Clone)]
pub struct HazardConfig {
    pub archive_root: PathBuf,
    pub public_key: PathBuf,
}

/// Static policy for dispositions.
#[derive(Debug, Clone)]
pub struct DispositionPolicy {
    pub destination_root: PathBuf,
    pub hazard: Option<HazardConfig>,
    pub delete_source_files: bool,
    pub defender_handles_suspect_files: bool,
}

/// What happened to a file, fed back into the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispositionOutcome {
    pub outcome: FileOutcome,
    pub destination_path: Option<PathBuf>,
    pub error_reason: Option<String>,
}

impl DispositionOutcome {
    fn success(destination_path: PathBuf) -> Self {
        Self {
            outcome: FileOutcome::Success,
            destination_path: Some(destination_path),
            error_reason: None,
        }
    }

    fn suspect(error_reason: Option<String>) -> Self {
        Self {
            outcome: FileOutcome::Suspect,
            destination_path: None,
            error_reason,
        }
    }

    fn failed(error_reason: String) -> Self {
        Self {
            outcome: FileOutcome::Failed,
            destination_path: None,
            error_reason: Some(error_reason),
        }
    }
}

/// Applies terminal effects per scan verdict.
pub struct DispositionHandler<E: EncryptAdapter, C: Clock> {
    policy: DispositionPolicy,
    encryptor: E,
    clock: C,
}

impl<E: EncryptAdapter, C: Clock> DispositionHandler<E, C> {
    pub fn new(policy: DispositionPolicy, encryptor: E, clock: C) -> Self {
        Self {
            policy,
            encryptor,
            clock,
        }
    }

    pub async fn handle(
        &self,
        job: &ScanJob,
        verdict: FileVerdict,
        results: &ScannerResults,
    ) -> DispositionOutcome {
        match verdict {
            FileVerdict::Clean => self.deliver_clean(job),
            FileVerdict::Suspect => self.archive_suspect(job, results).await,
            FileVerdict::Failed => record_failure(job, results),
        }
    }

    /// Move the quarantine copy into the destination tree and verify
    /// the delivered bytes by hash.
    fn deliver_clean(&self, job: &ScanJob) -> DispositionOutcome {
        let destination = self.policy.destination_root.join(&job.rel_path);

        let outcome = match self.try_deliver(job, &destination) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path = %job.quarantine_path.display(), error = %e, "delivery failed");
                DispositionOutcome::failed(format!("delivery failed: {e}"))
            }
        };

        if outcome.outcome == FileOutcome::Success {
            self.cleanup_source(job);
        }
        outcome
    }

    fn try_deliver(
        &self,
        job: &ScanJob,
        destination: &PathBuf,
    ) -> Result<DispositionOutcome, FileOpsError> {
        if destination.exists() {
            // Idempotent re-delivery: same content already in place
            if fileops::hash_file(destination)? == job.hash {
                info!(destination = %destination.display(), "destination already holds this content");
                fileops::remove_quarantine_copy(&job.quarantine_path);
                return Ok(DispositionOutcome::success(destination.clone()));
            }
            // Different content at the destination path: hands off,
            // quarantine copy kept for inspection
            return Ok(DispositionOutcome::failed(format!(
                "destination collision at {}",
                destination.display()
            )));
        }

        fileops::atomic_move(&job.quarantine_path, destination)?;

        let delivered = fileops::hash_file(destination)?;
        if delivered != job.hash {
            // Pull the corrupt artifact back out of the trusted tree
            warn!(
                destination = %destination.display(),
                expected = %job.hash,
                actual = %delivered,
                "post-delivery hash mismatch, returning file to quarantine"
            );
            let _ = std::fs::rename(destination, &job.quarantine_path);
            return Ok(DispositionOutcome::failed(format!(
                "hash mismatch after delivery to {}",
                destination.display()
            )));
        }

        info!(destination = %destination.display(), size = job.size_bytes, "file delivered");
        Ok(DispositionOutcome::success(destination.clone()))
    }

    /// Isolate a suspect file: scanner self-quarantine when configured
    /// and confirmed, otherwise encrypt into the hazard archive (or
    /// plain removal when no archive is configured).
    async fn archive_suspect(&self, job: &ScanJob, results: &ScannerResults) -> DispositionOutcome {
        let defender_threat = matches!(results.get(DEFENDER), Some(ScanVerdict::Threat { .. }));

        if self.policy.defender_handles_suspect_files && defender_threat {
            if !job.quarantine_path.exists() {
                info!(
                    hash = %job.hash,
                    "defender removed the quarantined threat itself"
                );
                self.cleanup_source(job);
                return DispositionOutcome::suspect(None);
            }
            warn!(
                path = %job.quarantine_path.display(),
                "defender reported a threat but left the file; archiving manually"
            );
        }

        let mut error_reason = None;
        let mut encrypt_failed = false;

        if let Some(hazard) = &self.policy.hazard {
            let cipher_path = hazard.archive_root.join(self.hazard_name(job));
            match self
                .encryptor
                .encrypt(&job.quarantine_path, &cipher_path, &hazard.public_key)
                .await
            {
                Ok(()) => {
                    info!(
                        cipher = %cipher_path.display(),
                        hash = %job.hash,
                        "suspect file encrypted into hazard archive"
                    );
                }
                Err(e) => {
                    // Plaintext must not linger; the source is kept as
                    // the only remaining copy
                    warn!(path = %job.quarantine_path.display(), error = %e, "hazard encryption failed");
                    encrypt_failed = true;
                    error_reason = Some(format!("hazard encryption failed: {e}"));
                }
            }
        } else {
            info!(
                path = %job.quarantine_path.display(),
                "no hazard archive configured, removing suspect file"
            );
        }

        fileops::remove_quarantine_copy(&job.quarantine_path);

        if !encrypt_failed {
            self.cleanup_source(job);
        }

        DispositionOutcome::suspect(error_reason)
    }

    /// `<original_basename>_<timestamp>_<hash_prefix>.gpg`
    fn hazard_name(&self, job: &ScanJob) -> String {
        let basename = job
            .quarantine_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let stamp = self.clock.now().format("%Y%m%dT%H%M%S");
        let prefix = job.hash.get(..8).unwrap_or(&job.hash);
        format!("{basename}_{stamp}_{prefix}.gpg")
    }

    /// Remove the source copy behind the hash guard, when enabled.
    /// A mutated source is left alone and logged.
    fn cleanup_source(&self, job: &ScanJob) {
        if !self.policy.delete_source_files || !job.source_path.exists() {
            return;
        }
        match fileops::safe_delete(&job.source_path, &job.hash) {
            Ok(()) => info!(path = %job.source_path.display(), "source file removed"),
            Err(FileOpsError::HashMismatch { .. }) => {
                warn!(
                    path = %job.source_path.display(),
                    "source changed since quarantine, leaving it in place"
                );
            }
            Err(e) => {
                warn!(path = %job.source_path.display(), error = %e, "source removal failed");
            }
        }
    }
}

/// Failed files stay where they are: quarantine copy for post-mortem,
/// source untouched.
fn record_failure(job: &ScanJob, results: &ScannerResults) -> DispositionOutcome {
    let mut reasons: Vec<String> = results
        .iter()
        .filter_map(|(name, verdict)| match verdict {
            ScanVerdict::Error { kind, detail } => Some(format!("{name}: {kind}: {detail}")),
            _ => None,
        })
        .collect();
    if reasons.is_empty() {
        reasons.push("scan failed".to_string());
    }
    warn!(path = %job.quarantine_path.display(), reason = %reasons.join("; "), "file failed");
    DispositionOutcome::failed(reasons.join("; "))
}

#[cfg(test)]
#[path = "disposition_tests.rs"]
mod tests;
