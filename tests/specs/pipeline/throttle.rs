// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission throttling across the whole pipeline.

use crate::prelude::*;
use shuttle_engine::ThrottleConfig;
use std::time::Duration;

#[tokio::test]
async fn disk_space_throttle_admits_exactly_what_fits() {
    let mut w = world();
    w.config.throttle = ThrottleConfig {
        enabled: true,
        min_free_mb: 1,
        max_files_per_day: 0,
        max_volume_mb_per_day: 0,
        max_volume_mb_per_run: 0,
    };
    // Quarantine holds 4MB; 1MB files with a 1MB reserve -> 3 fit
    w.probe.set_capacity(&w.quarantine, 4 * MB);
    // Slow scans so the quarantine stays full during admission
    w.scanner.set_delay(Duration::from_millis(150));

    for i in 0..5 {
        write_source(&w, &format!("big-{i}.bin"), &vec![i as u8; MB as usize]);
    }

    let summary = driver(&w).run().await.unwrap();

    assert_eq!(summary.totals.admitted, 3);
    assert_eq!(summary.totals.clean, 3);
    // The rest stayed in source for the next run
    assert_eq!(list(&w.source).len(), 2);

    // One DiskLow notification, not one per refused file
    let throttle_calls = w.notifier.calls_for_topic("throttle");
    assert_eq!(throttle_calls.len(), 1);
    assert!(throttle_calls[0].body.contains("low disk space"));
}

#[tokio::test]
async fn daily_count_cap_carries_across_runs() {
    let mut w = world();
    w.config.throttle = ThrottleConfig {
        enabled: true,
        min_free_mb: 0,
        max_files_per_day: 10,
        max_volume_mb_per_day: 0,
        max_volume_mb_per_run: 0,
    };

    // Earlier run today already processed 7 files
    for i in 0..7 {
        write_source(&w, &format!("early-{i}.bin"), format!("early {i}").as_bytes());
    }
    let first = driver(&w).run().await.unwrap();
    assert_eq!(first.totals.clean, 7);
    assert!(first.refusals.is_empty());

    // 5 more arrive; only 3 fit under today's cap of 10
    for i in 0..5 {
        write_source(&w, &format!("late-{i}.bin"), format!("late {i}").as_bytes());
    }
    let second = driver(&w).run().await.unwrap();

    assert_eq!(second.totals.admitted, 3);
    assert_eq!(list(&w.source).len(), 2);

    let state = today_state(&w);
    assert_eq!(state.totals.processed_count(), 10);

    // At most one DailyCount notification across the day
    assert_eq!(w.notifier.calls_for_topic("throttle").len(), 1);
}

#[tokio::test]
async fn daily_volume_cap_counts_bytes_not_files() {
    let mut w = world();
    w.config.throttle = ThrottleConfig {
        enabled: true,
        min_free_mb: 0,
        max_files_per_day: 0,
        max_volume_mb_per_day: 3,
        max_volume_mb_per_run: 0,
    };

    for i in 0..5 {
        write_source(&w, &format!("vol-{i}.bin"), &vec![i as u8; MB as usize]);
    }

    let summary = driver(&w).run().await.unwrap();

    assert_eq!(summary.totals.admitted, 3);
    assert_eq!(summary.refusals.len(), 1);
    assert!(summary.refusals[0].contains("daily volume"), "{}", summary.refusals[0]);
}

#[tokio::test]
async fn per_run_volume_cap_resets_between_runs() {
    let mut w = world();
    w.config.throttle = ThrottleConfig {
        enabled: true,
        min_free_mb: 0,
        max_files_per_day: 0,
        max_volume_mb_per_day: 0,
        max_volume_mb_per_run: 2,
    };

    for i in 0..3 {
        write_source(&w, &format!("run1-{i}.bin"), &vec![i as u8; MB as usize]);
    }
    let first = driver(&w).run().await.unwrap();
    assert_eq!(first.totals.admitted, 2);
    assert_eq!(list(&w.source).len(), 1);

    // A fresh run gets a fresh per-run budget
    let second = driver(&w).run().await.unwrap();
    assert_eq!(second.totals.admitted, 1);
    assert!(list(&w.source).is_empty());
}
