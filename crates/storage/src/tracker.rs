// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daily processing tracker: single-writer record keeping with
//! crash-safe persistence.
//!
//! The driver owns the tracker exclusively; scan workers never touch
//! it. Completions persist immediately, registrations on a bounded
//! interval, and shutdown always persists, so at most a few seconds of
//! registrations can be replayed after a crash — completed outcomes
//! are never lost.

use crate::day_file::{self, state_file_path, StateFileError};
use crate::state::{DayState, RegisterOutcome, StateError};
use chrono::NaiveDate;
use shuttle_core::{Clock, DailyAggregate, FileOutcome, FileRecord, ScannerResults};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// How often registration-only changes are flushed to disk.
const PERSIST_INTERVAL: Duration = Duration::from_secs(5);

/// Reason recorded on records closed out by an interrupted run.
pub const INTERRUPTED_REASON: &str = "interrupted";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    File(#[from] StateFileError),
}

/// Hash-keyed per-day record store. See module docs for the write
/// discipline.
pub struct DailyProcessingTracker<C: Clock> {
    dir: PathBuf,
    clock: C,
    current: DayState,
    /// Previous day carried across a mid-run midnight rollover; still
    /// accepts completions for files registered before midnight.
    prior: Option<DayState>,
    persist_interval: Duration,
    last_persist: Instant,
    dirty: bool,
}

impl<C: Clock> DailyProcessingTracker<C> {
    /// Open the tracker for today.
    ///
    /// Any earlier day files with pending records are closed out
    /// (pending → Failed("interrupted")) and saved back; they are not
    /// loaded into the active set. Today's file, if present, restores
    /// both completed and pending records.
    pub fn open(dir: PathBuf, clock: C) -> Result<Self, StateFileError> {
        std::fs::create_dir_all(&dir)?;
        let today = clock.today();

        for (date, path) in day_file::list_day_files(&dir)? {
            if date >= today {
                continue;
            }
            if let Some(mut stale) = day_file::load(&path)? {
                if stale.has_pending() {
                    let closed = stale.close_pending(INTERRUPTED_REASON, clock.now());
                    info!(
                        date = %date,
                        closed = closed.len(),
                        "closed out pending records from a prior day"
                    );
                    day_file::save(&stale, &path)?;
                }
            }
        }

        let current = match day_file::load(&state_file_path(&dir, today))? {
            Some(mut state) => {
                let recomputed = state.recomputed_totals();
                if recomputed != state.totals {
                    warn!(date = %today, "day file aggregates disagreed with records, recomputed");
                    state.totals = recomputed;
                }
                info!(
                    date = %today,
                    records = state.records.len(),
                    pending = state.totals.pending.count,
                    "restored today's tracker state"
                );
                state
            }
            None => DayState::new(today),
        };

        Ok(Self {
            dir,
            clock,
            current,
            prior: None,
            persist_interval: PERSIST_INTERVAL,
            last_persist: Instant::now(),
            dirty: false,
        })
    }

    /// Override the registration flush interval (tests).
    pub fn with_persist_interval(mut self, interval: Duration) -> Self {
        self.persist_interval = interval;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.current.date
    }

    pub fn record(&self, hash: &str) -> Option<&FileRecord> {
        self.current
            .records
            .get(hash)
            .or_else(|| self.prior.as_ref().and_then(|p| p.records.get(hash)))
    }

    pub fn day_state(&self) -> &DayState {
        &self.current
    }

    /// Today's aggregates, after any due midnight rollover.
    pub fn snapshot(&mut self) -> Result<DailyAggregate, StateFileError> {
        self.roll_over_if_needed()?;
        Ok(self.current.totals)
    }

    /// Register a quarantined file under its content hash.
    pub fn register(
        &mut self,
        hash: &str,
        source_path: PathBuf,
        quarantine_path: PathBuf,
        size_bytes: u64,
    ) -> Result<RegisterOutcome, TrackerError> {
        self.roll_over_if_needed()?;
        let outcome = self.current.register(
            hash,
            source_path,
            quarantine_path,
            size_bytes,
            self.clock.now(),
        );
        if matches!(outcome, RegisterOutcome::Fresh(_)) {
            self.dirty = true;
            self.maybe_persist()?;
        }
        Ok(outcome)
    }

    /// Complete a registered record. Persists immediately so a crash
    /// after this point cannot lose the outcome.
    pub fn complete(
        &mut self,
        hash: &str,
        outcome: FileOutcome,
        destination_path: Option<PathBuf>,
        error_reason: Option<String>,
        scanner_results: ScannerResults,
    ) -> Result<FileRecord, TrackerError> {
        let now = self.clock.now();

        if self.current.records.contains_key(hash) {
            let record = self.current.complete(
                hash,
                outcome,
                destination_path,
                error_reason,
                scanner_results,
                now,
            )?;
            self.persist()?;
            return Ok(record);
        }

        // Registered before a mid-run midnight rollover
        if let Some(prior) = self.prior.as_mut() {
            if prior.records.contains_key(hash) {
                let record = prior.complete(
                    hash,
                    outcome,
                    destination_path,
                    error_reason,
                    scanner_results,
                    now,
                )?;
                self.persist()?;
                return Ok(record);
            }
        }

        Err(StateError::UnknownRecord(hash.to_string()).into())
    }

    /// Write all held day states durably.
    pub fn persist(&mut self) -> Result<(), StateFileError> {
        if let Some(prior) = &self.prior {
            day_file::save(prior, &state_file_path(&self.dir, prior.date))?;
        }
        day_file::save(&self.current, &state_file_path(&self.dir, self.current.date))?;
        self.last_persist = Instant::now();
        self.dirty = false;
        Ok(())
    }

    /// Close the tracker at end of run: remaining pending records are
    /// failed with the driver's reason (normally
    /// [`INTERRUPTED_REASON`]) and everything is persisted. Returns
    /// the records that were closed out.
    pub fn close(&mut self, pending_reason: &str) -> Result<Vec<FileRecord>, StateFileError> {
        let now = self.clock.now();
        let mut closed = Vec::new();
        if let Some(prior) = self.prior.as_mut() {
            closed.extend(prior.close_pending(pending_reason, now));
        }
        closed.extend(self.current.close_pending(pending_reason, now));
        self.persist()?;
        Ok(closed)
    }

    fn maybe_persist(&mut self) -> Result<(), StateFileError> {
        if self.dirty && self.last_persist.elapsed() >= self.persist_interval {
            self.persist()?;
        }
        Ok(())
    }

    fn roll_over_if_needed(&mut self) -> Result<(), StateFileError> {
        let today = self.clock.today();
        if today == self.current.date {
            return Ok(());
        }

        info!(from = %self.current.date, to = %today, "tracker day rollover");

        // A doubly-stale carry-over cannot accept completions any more;
        // close it out before replacing it.
        if let Some(mut stale) = self.prior.take() {
            stale.close_pending(INTERRUPTED_REASON, self.clock.now());
            day_file::save(&stale, &state_file_path(&self.dir, stale.date))?;
        }

        let finished = std::mem::replace(&mut self.current, DayState::new(today));
        day_file::save(&finished, &state_file_path(&self.dir, finished.date))?;
        self.prior = Some(finished);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
