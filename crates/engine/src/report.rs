// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-of-run summary.

use chrono::{DateTime, Local};
use shuttle_core::DailyAggregate;

/// Per-run counters, independent of the tracker's daily totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub discovered: usize,
    pub admitted: usize,
    pub skipped_duplicate: usize,
    pub skipped_unstable: usize,
    pub clean: usize,
    pub suspect: usize,
    pub failed: usize,
    /// Pending records closed out as Failed("interrupted") at shutdown
    pub interrupted_pending: usize,
}

/// Terminal classification of a run, mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    CompletedWithFailures,
    Interrupted,
}

/// Everything an operator wants to know about one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub totals: RunTotals,
    /// Today's aggregates after this run
    pub day: DailyAggregate,
    pub refusals: Vec<String>,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn status(&self) -> RunStatus {
        if self.interrupted {
            RunStatus::Interrupted
        } else if self.totals.failed > 0 || self.totals.interrupted_pending > 0 {
            RunStatus::CompletedWithFailures
        } else {
            RunStatus::Completed
        }
    }

    /// Multi-line report for the summary notification and the log.
    pub fn body(&self) -> String {
        let elapsed = self.finished_at.signed_duration_since(self.started_at);
        let mut out = String::new();

        out.push_str(&format!(
            "run {} ({} -> {}, {}s)\n",
            self.run_id,
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.finished_at.format("%H:%M:%S"),
            elapsed.num_seconds(),
        ));
        if self.interrupted {
            out.push_str("run was interrupted by a shutdown signal\n");
        }
        out.push_str(&format!(
            "discovered {} file(s): {} admitted, {} duplicate(s) skipped, {} unstable skipped\n",
            self.totals.discovered,
            self.totals.admitted,
            self.totals.skipped_duplicate,
            self.totals.skipped_unstable,
        ));
        out.push_str(&format!(
            "outcomes: {} clean, {} suspect, {} failed, {} interrupted\n",
            self.totals.clean,
            self.totals.suspect,
            self.totals.failed,
            self.totals.interrupted_pending,
        ));
        out.push_str(&format!(
            "today so far: {} file(s), {} MB ({} suspect, {} failed)\n",
            self.day.processed_count(),
            self.day.processed_volume_bytes() / (1024 * 1024),
            self.day.suspect.count,
            self.day.failed.count,
        ));
        for refusal in &self.refusals {
            out.push_str(&format!("throttled: {refusal}\n"));
        }
        out
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
