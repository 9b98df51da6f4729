// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory state for one local calendar day.
//!
//! Records are keyed by content hash; identical content re-ingested
//! within the day collapses onto one record. Aggregates move with the
//! record state machine: register adds to pending, complete moves the
//! file into its terminal bucket.

use chrono::{DateTime, Local, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shuttle_core::{DailyAggregate, FileOutcome, FileRecord, FileStatus, ScannerResults};
use std::path::PathBuf;
use thiserror::Error;

/// State-machine violations. These indicate driver bugs, not bad input.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("no record registered for hash {0}")]
    UnknownRecord(String),

    #[error("record {0} is already completed")]
    AlreadyCompleted(String),

    #[error("cannot complete record {0} with outcome 'unknown'")]
    OutcomeUnknown(String),
}

/// Result of registering a quarantined file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// New record created; pending aggregates incremented
    Fresh(FileRecord),
    /// A pending record for this hash already existed (crash recovery)
    ResumedPending(FileRecord),
    /// This content already completed today; the driver skips it
    AlreadyCompleted(FileRecord),
}

impl RegisterOutcome {
    pub fn record(&self) -> &FileRecord {
        match self {
            RegisterOutcome::Fresh(r)
            | RegisterOutcome::ResumedPending(r)
            | RegisterOutcome::AlreadyCompleted(r) => r,
        }
    }
}

/// Records and aggregates for one local calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayState {
    pub date: NaiveDate,
    /// Hash-keyed records in registration order
    pub records: IndexMap<String, FileRecord>,
    pub totals: DailyAggregate,
}

impl DayState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            records: IndexMap::new(),
            totals: DailyAggregate::default(),
        }
    }

    /// Register a quarantined file, idempotently per content hash.
    pub fn register(
        &mut self,
        hash: &str,
        source_path: PathBuf,
        quarantine_path: PathBuf,
        size_bytes: u64,
        now: DateTime<Local>,
    ) -> RegisterOutcome {
        if let Some(existing) = self.records.get(hash) {
            return match existing.status {
                FileStatus::Completed => RegisterOutcome::AlreadyCompleted(existing.clone()),
                FileStatus::Pending => RegisterOutcome::ResumedPending(existing.clone()),
            };
        }

        let record = FileRecord::pending(hash, source_path, quarantine_path, size_bytes, now);
        self.totals.pending.add(size_bytes);
        self.records.insert(hash.to_string(), record.clone());
        RegisterOutcome::Fresh(record)
    }

    /// Move a pending record to its terminal outcome. Exactly once per
    /// record; a second call is an error.
    #[allow(clippy::too_many_arguments)]
    pub fn complete(
        &mut self,
        hash: &str,
        outcome: FileOutcome,
        destination_path: Option<PathBuf>,
        error_reason: Option<String>,
        scanner_results: ScannerResults,
        completed_at: DateTime<Local>,
    ) -> Result<FileRecord, StateError> {
        if outcome == FileOutcome::Unknown {
            return Err(StateError::OutcomeUnknown(hash.to_string()));
        }

        let record = self
            .records
            .get_mut(hash)
            .ok_or_else(|| StateError::UnknownRecord(hash.to_string()))?;

        if record.is_completed() {
            return Err(StateError::AlreadyCompleted(hash.to_string()));
        }

        record.status = FileStatus::Completed;
        record.outcome = outcome;
        record.destination_path = destination_path;
        record.error_reason = error_reason;
        record.scanner_results = scanner_results;
        record.completed_at = Some(completed_at);

        let size = record.size_bytes;
        let completed = record.clone();

        self.totals.pending.remove(size);
        if let Some(bucket) = self.totals.terminal_mut(outcome) {
            bucket.add(size);
        }

        Ok(completed)
    }

    /// Fail every still-pending record (shutdown / prior-day closeout).
    /// Returns the records that were closed.
    pub fn close_pending(&mut self, reason: &str, at: DateTime<Local>) -> Vec<FileRecord> {
        let pending: Vec<String> = self
            .records
            .iter()
            .filter(|(_, r)| r.is_pending())
            .map(|(hash, _)| hash.clone())
            .collect();

        let mut closed = Vec::with_capacity(pending.len());
        for hash in pending {
            // Pending records always complete cleanly here
            if let Ok(record) = self.complete(
                &hash,
                FileOutcome::Failed,
                None,
                Some(reason.to_string()),
                ScannerResults::new(),
                at,
            ) {
                closed.push(record);
            }
        }
        closed
    }

    pub fn has_pending(&self) -> bool {
        self.records.values().any(FileRecord::is_pending)
    }

    /// Recompute aggregates from the record set. Used to re-establish
    /// the conservation invariant after loading a day file.
    pub fn recomputed_totals(&self) -> DailyAggregate {
        let mut totals = DailyAggregate::default();
        for record in self.records.values() {
            match record.status {
                FileStatus::Pending => totals.pending.add(record.size_bytes),
                FileStatus::Completed => {
                    if let Some(bucket) = totals.terminal_mut(record.outcome) {
                        bucket.add(record.size_bytes);
                    }
                }
            }
        }
        totals
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
