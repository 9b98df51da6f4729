// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery and idempotent re-ingest.

use crate::prelude::*;
use chrono::NaiveDate;
use shuttle_core::{Clock, FileOutcome};
use shuttle_engine::fileops;
use shuttle_storage::{day_file, DayState};

#[tokio::test]
async fn same_content_twice_in_a_day_yields_one_record_and_one_copy() {
    let w = world();
    write_source(&w, "invoice.pdf", b"invoice body v1");

    let first = driver(&w).run().await.unwrap();
    assert_eq!(first.totals.clean, 1);

    // The same bytes are submitted again later the same day
    write_source(&w, "invoice.pdf", b"invoice body v1");
    let second = driver(&w).run().await.unwrap();

    assert_eq!(second.totals.skipped_duplicate, 1);
    assert_eq!(second.totals.admitted, 0);

    let state = today_state(&w);
    assert_eq!(state.records.len(), 1, "one Completed record");
    assert_eq!(list(&w.destination), vec!["invoice.pdf".to_string()]);
    assert!(list(&w.source).is_empty(), "duplicate source drained too");
}

#[tokio::test]
async fn interrupted_pending_record_is_reprocessed_on_restart() {
    let w = world();

    // Simulate a crashed previous run: the file was quarantined and
    // registered Pending, then the process died before scanning.
    let content = b"halfway through";
    write_source(&w, "resume.bin", content);
    std::fs::create_dir_all(&w.quarantine).unwrap();
    let quarantine_path = w.quarantine.join("resume.bin");
    std::fs::write(&quarantine_path, content).unwrap();
    let hash = fileops::hash_file(&quarantine_path).unwrap();

    let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    let mut crashed = DayState::new(date);
    crashed.register(
        &hash,
        w.source.join("resume.bin"),
        quarantine_path,
        content.len() as u64,
        w.clock.now(),
    );
    day_file::save(&crashed, &day_file::state_file_path(&w.state, date)).unwrap();

    // Restart within the same day
    let summary = driver(&w).run().await.unwrap();

    assert_eq!(summary.totals.admitted, 1, "pending record was resumed");
    assert_eq!(summary.totals.clean, 1);

    let state = today_state(&w);
    assert_eq!(state.records.len(), 1, "no second record for the hash");
    let record = &state.records[&hash];
    assert_eq!(record.outcome, FileOutcome::Success);
    assert!(w.destination.join("resume.bin").exists());
}

#[tokio::test]
async fn completed_outcomes_survive_restart_unchanged() {
    let w = world();
    write_source(&w, "done.bin", b"already processed");
    driver(&w).run().await.unwrap();

    let before = today_state(&w);
    let record_before = before.records.values().next().unwrap().clone();

    // Restart with nothing new to do
    let summary = driver(&w).run().await.unwrap();
    assert_eq!(summary.totals.admitted, 0);

    let after = today_state(&w);
    let record_after = after.records.values().next().unwrap();
    assert_eq!(*record_after, record_before, "outcome identical after restart");
}

#[tokio::test]
async fn yesterdays_pending_is_closed_out_not_resumed() {
    let w = world();

    // A pending record from yesterday's interrupted run
    let yesterday = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
    let mut stale = DayState::new(yesterday);
    stale.register(
        "0".repeat(64).as_str(),
        w.source.join("old.bin"),
        w.quarantine.join("old.bin"),
        123,
        w.clock.now() - chrono::Duration::days(1),
    );
    std::fs::create_dir_all(&w.state).unwrap();
    day_file::save(&stale, &day_file::state_file_path(&w.state, yesterday)).unwrap();

    driver(&w).run().await.unwrap();

    // Yesterday's file now shows Failed("interrupted")
    let closed = day_file::load(&day_file::state_file_path(&w.state, yesterday))
        .unwrap()
        .unwrap();
    assert!(!closed.has_pending());
    let record = closed.records.values().next().unwrap();
    assert_eq!(record.outcome, FileOutcome::Failed);
    assert_eq!(record.error_reason.as_deref(), Some("interrupted"));

    // And today started from zero
    let today = today_state(&w);
    assert_eq!(today.records.len(), 0);
}

#[tokio::test]
async fn mutated_source_is_not_deleted_after_delivery() {
    let w = world();
    write_source(&w, "volatile.bin", b"contents at quarantine time");
    // The scan sits long enough for the source to change under us
    w.scanner.set_delay(std::time::Duration::from_millis(80));

    let source_path = w.source.join("volatile.bin");
    let rewrite = tokio::spawn({
        let source_path = source_path.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(40)).await;
            std::fs::write(&source_path, b"replaced while scanning").unwrap();
        }
    });

    let summary = driver(&w).run().await.unwrap();
    rewrite.await.unwrap();

    // Delivery succeeded from the quarantined copy
    assert_eq!(summary.totals.clean, 1);
    assert!(w.destination.join("volatile.bin").exists());
    // The rewritten source survives the hash-guarded delete
    assert_eq!(
        std::fs::read(&source_path).unwrap(),
        b"replaced while scanning"
    );
}
