// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission throttling.
//!
//! Before a candidate enters the pipeline, every enabled rule must
//! agree: enough free space in each working directory, and the daily
//! count, daily volume, and per-run volume caps not exceeded. Counts
//! include already-admitted pending work so in-flight files cannot
//! overshoot a limit.

use shuttle_adapters::SpaceProbe;
use shuttle_core::DailyAggregate;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

const MB: u64 = 1024 * 1024;

/// Throttle rule parameters. A limit of 0 disables that rule.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub enabled: bool,
    /// Free space each working directory must keep after admission
    pub min_free_mb: u64,
    pub max_files_per_day: u64,
    pub max_volume_mb_per_day: u64,
    pub max_volume_mb_per_run: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_free_mb: 100,
            max_files_per_day: 0,
            max_volume_mb_per_day: 0,
            max_volume_mb_per_run: 0,
        }
    }
}

/// Why a candidate was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleReason {
    DiskLow { dir: PathBuf, free_mb: u64 },
    DailyCount { limit: u64 },
    DailyVolume { limit_mb: u64 },
    RunVolume { limit_mb: u64 },
}

impl ThrottleReason {
    pub fn kind(&self) -> ThrottleReasonKind {
        match self {
            ThrottleReason::DiskLow { .. } => ThrottleReasonKind::DiskLow,
            ThrottleReason::DailyCount { .. } => ThrottleReasonKind::DailyCount,
            ThrottleReason::DailyVolume { .. } => ThrottleReasonKind::DailyVolume,
            ThrottleReason::RunVolume { .. } => ThrottleReasonKind::RunVolume,
        }
    }
}

impl fmt::Display for ThrottleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrottleReason::DiskLow { dir, free_mb } => {
                write!(f, "low disk space: {} has {}MB free", dir.display(), free_mb)
            }
            ThrottleReason::DailyCount { limit } => {
                write!(f, "daily file count limit reached ({limit})")
            }
            ThrottleReason::DailyVolume { limit_mb } => {
                write!(f, "daily volume limit reached ({limit_mb}MB)")
            }
            ThrottleReason::RunVolume { limit_mb } => {
                write!(f, "per-run volume limit reached ({limit_mb}MB)")
            }
        }
    }
}

/// Refusal category, used to coalesce notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottleReasonKind {
    DiskLow,
    DailyCount,
    DailyVolume,
    RunVolume,
}

/// Admission gate for one run.
pub struct Throttler<P: SpaceProbe> {
    config: ThrottleConfig,
    probe: P,
    /// Bytes admitted by this run, for the per-run volume rule
    run_volume_bytes: u64,
    notified: HashSet<ThrottleReasonKind>,
}

impl<P: SpaceProbe> Throttler<P> {
    pub fn new(config: ThrottleConfig, probe: P) -> Self {
        Self {
            config,
            probe,
            run_volume_bytes: 0,
            notified: HashSet::new(),
        }
    }

    /// Decide admission for a candidate of `size_bytes`, against the
    /// given working directories and today's aggregates.
    pub fn admit(
        &mut self,
        size_bytes: u64,
        dirs: &[&Path],
        today: &DailyAggregate,
    ) -> Result<(), ThrottleReason> {
        if !self.config.enabled {
            return Ok(());
        }

        for dir in dirs {
            let free = match self.probe.free_bytes(dir) {
                Ok(free) => free,
                Err(e) => {
                    // An unknown reading is treated as no space at all
                    warn!(dir = %dir.display(), error = %e, "free-space probe failed");
                    0
                }
            };
            if free.saturating_sub(size_bytes) < self.config.min_free_mb * MB {
                return Err(ThrottleReason::DiskLow {
                    dir: dir.to_path_buf(),
                    free_mb: free / MB,
                });
            }
        }

        let limit = self.config.max_files_per_day;
        if limit > 0 && today.admitted_count() + 1 > limit {
            return Err(ThrottleReason::DailyCount { limit });
        }

        let limit_mb = self.config.max_volume_mb_per_day;
        if limit_mb > 0 && today.admitted_volume_bytes() + size_bytes > limit_mb * MB {
            return Err(ThrottleReason::DailyVolume { limit_mb });
        }

        let limit_mb = self.config.max_volume_mb_per_run;
        if limit_mb > 0 && self.run_volume_bytes + size_bytes > limit_mb * MB {
            return Err(ThrottleReason::RunVolume { limit_mb });
        }

        self.run_volume_bytes += size_bytes;
        Ok(())
    }

    /// True the first time a refusal of this kind is seen this run;
    /// repeated refusals for the same reason coalesce.
    pub fn first_refusal(&mut self, reason: &ThrottleReason) -> bool {
        self.notified.insert(reason.kind())
    }
}

#[cfg(test)]
#[path = "throttle_tests.rs"]
mod tests;
