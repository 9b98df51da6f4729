// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance exclusion and graceful shutdown.

use crate::prelude::*;
use shuttle_core::Clock;
use shuttle_engine::{EngineError, InstanceLock, LockError, RunStatus};
use std::time::Duration;

#[tokio::test]
async fn second_instance_exits_without_touching_anything() {
    let w = world();
    write_source(&w, "pending.bin", b"waiting to be processed");

    std::fs::create_dir_all(&w.state).unwrap();
    let held = InstanceLock::acquire(&w.config.lock_path, w.clock.now()).unwrap();

    let err = driver(&w).run().await.unwrap_err();
    assert!(
        matches!(err, EngineError::Lock(LockError::AlreadyRunning(_))),
        "{err}"
    );

    // No mutation under source, quarantine, destination or hazard
    assert_eq!(list(&w.source), vec!["pending.bin".to_string()]);
    assert!(!w.quarantine.exists());
    assert!(!w.destination.exists());
    assert!(!w.hazard.exists());
    assert_eq!(w.scanner.call_count(), 0);

    drop(held);
}

#[tokio::test]
async fn lock_released_after_a_run_allows_the_next() {
    let w = world();
    write_source(&w, "a.bin", b"one");
    driver(&w).run().await.unwrap();

    assert!(!w.config.lock_path.exists(), "lock file removed");

    write_source(&w, "b.bin", b"two");
    let summary = driver(&w).run().await.unwrap();
    assert_eq!(summary.totals.clean, 1);
}

#[tokio::test]
async fn term_signal_drains_in_flight_and_persists_terminal_state() {
    let w = world();
    // 20 queued files, 2 workers, slow scans
    w.scanner.set_delay(Duration::from_millis(40));
    for i in 0..20 {
        write_source(&w, &format!("f{i:02}.bin"), format!("payload {i}").as_bytes());
    }

    let d = driver(&w);
    let shutdown = d.shutdown_flag();
    tokio::spawn(async move {
        // Roughly three scans in, ask for shutdown
        tokio::time::sleep(Duration::from_millis(90)).await;
        shutdown.set();
    });

    let summary = d.run().await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.status(), RunStatus::Interrupted);
    assert!(summary.totals.clean >= 1, "{:?}", summary.totals);

    // Every record in the persisted day state is terminal
    let state = today_state(&w);
    assert!(!state.has_pending());
    assert_eq!(
        state.totals.successful.count + state.totals.failed.count,
        state.records.len() as u64
    );
    let interrupted = state
        .records
        .values()
        .filter(|r| r.error_reason.as_deref() == Some("interrupted"))
        .count();
    assert_eq!(interrupted as u64, state.totals.failed.count);

    // Lock released despite the interruption
    assert!(!w.config.lock_path.exists());
}
