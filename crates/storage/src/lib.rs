// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shuttle-storage: the daily processing tracker and its durable
//! per-day state files.

pub mod day_file;
pub mod state;
pub mod tracker;

pub use day_file::{state_file_path, StateFileError};
pub use state::{DayState, RegisterOutcome, StateError};
pub use tracker::{DailyProcessingTracker, TrackerError, INTERRUPTED_REASON};
