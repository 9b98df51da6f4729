// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File record and scan verdict state machine.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Per-scanner results, keyed by scanner name (deterministic order).
pub type ScannerResults = BTreeMap<String, ScanVerdict>;

/// Error classes a scanner invocation can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorKind {
    /// Invocation exceeded its computed deadline
    Timeout,
    /// Scanner process could not be started or its I/O failed
    Launch,
    /// Scanner ran but its exit status / output was not recognised
    Unrecognized,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanErrorKind::Timeout => write!(f, "timeout"),
            ScanErrorKind::Launch => write!(f, "launch"),
            ScanErrorKind::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Verdict from a single scanner invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ScanVerdict {
    /// Scanner examined the file and found nothing
    Clean,
    /// Scanner recognised a threat
    Threat { name: String },
    /// Scanner could not produce a verdict (retryable)
    Error { kind: ScanErrorKind, detail: String },
}

impl ScanVerdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, ScanVerdict::Clean)
    }

    pub fn is_threat(&self) -> bool {
        matches!(self, ScanVerdict::Threat { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ScanVerdict::Error { .. })
    }
}

/// Aggregate verdict for a file across all configured scanners.
///
/// Priority when scanners disagree: Threat > Error > Clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileVerdict {
    /// Every scanner reported Clean
    Clean,
    /// At least one scanner reported Threat
    Suspect,
    /// No Threat, but at least one scanner errored after retries
    Failed,
}

impl FileVerdict {
    /// Fold per-scanner verdicts into the file-level verdict.
    pub fn from_results(results: &ScannerResults) -> Self {
        if results.values().any(ScanVerdict::is_threat) {
            FileVerdict::Suspect
        } else if results.values().any(ScanVerdict::is_error) {
            FileVerdict::Failed
        } else {
            FileVerdict::Clean
        }
    }
}

/// Processing status of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Completed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Pending => write!(f, "pending"),
            FileStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Terminal outcome of a tracked file. Only meaningful once Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Unknown,
    Success,
    Suspect,
    Failed,
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Unknown => write!(f, "unknown"),
            FileOutcome::Success => write!(f, "success"),
            FileOutcome::Suspect => write!(f, "suspect"),
            FileOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Unit of tracking for one file content per day.
///
/// Identity is the SHA-256 digest of the quarantined copy, so identical
/// content re-ingested within the same day collapses onto one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Hex SHA-256 of the quarantined copy
    pub hash: String,
    pub source_path: PathBuf,
    pub quarantine_path: PathBuf,
    /// Final delivered path; set only on Success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,
    pub size_bytes: u64,
    pub first_seen_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Local>>,
    pub status: FileStatus,
    pub outcome: FileOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scanner_results: ScannerResults,
}

impl FileRecord {
    /// Create a fresh Pending record for a quarantined file.
    pub fn pending(
        hash: impl Into<String>,
        source_path: PathBuf,
        quarantine_path: PathBuf,
        size_bytes: u64,
        first_seen_at: DateTime<Local>,
    ) -> Self {
        Self {
            hash: hash.into(),
            source_path,
            quarantine_path,
            destination_path: None,
            size_bytes,
            first_seen_at,
            completed_at: None,
            status: FileStatus::Pending,
            outcome: FileOutcome::Unknown,
            error_reason: None,
            scanner_results: ScannerResults::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FileStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == FileStatus::Completed
    }

    /// First eight hex characters of the content digest, for log and
    /// archive-name disambiguation.
    pub fn hash_prefix(&self) -> &str {
        if self.hash.len() <= 8 {
            &self.hash
        } else {
            &self.hash[..8]
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
