// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan policy: all-must-be-clean, retries, and timeouts.

use crate::prelude::*;
use shuttle_adapters::FakeScanAdapter;
use shuttle_core::{FileOutcome, ScanErrorKind, ScanVerdict};
use shuttle_engine::PipelineDriver;
use std::sync::Arc;
use std::time::Duration;

fn driver_with_scanners(w: &World, scanners: &[&FakeScanAdapter]) -> SpecDriver {
    PipelineDriver::new(
        w.config.clone(),
        scanners
            .iter()
            .map(|s| Arc::new((*s).clone()) as Arc<dyn shuttle_adapters::ScanAdapter>)
            .collect(),
        w.encryptor.clone(),
        w.notifier.clone(),
        w.probe.clone(),
        w.clock.clone(),
    )
}

#[tokio::test]
async fn every_scanner_must_agree_for_a_clean_verdict() {
    let w = world();
    write_source(&w, "disputed.bin", b"one scanner disagrees");

    let clam = FakeScanAdapter::new("clamav");
    let defender = FakeScanAdapter::new("defender");
    defender.set_default(ScanVerdict::Threat {
        name: "Behavior.Suspicious".to_string(),
    });

    driver_with_scanners(&w, &[&clam, &defender]).run().await.unwrap();

    // One Threat anywhere makes the file Suspect, never delivered
    assert!(list(&w.destination).is_empty());
    assert_eq!(list(&w.hazard).len(), 1);

    let state = today_state(&w);
    let record = state.records.values().next().unwrap();
    assert_eq!(record.outcome, FileOutcome::Suspect);
}

#[tokio::test]
async fn transient_scanner_errors_are_retried_to_success() {
    let w = world();
    write_source(&w, "flaky.bin", b"eventually scannable");

    w.scanner.script(
        w.quarantine.join("flaky.bin"),
        vec![
            ScanVerdict::Error {
                kind: ScanErrorKind::Launch,
                detail: "daemon restarting".to_string(),
            },
            ScanVerdict::Clean,
        ],
    );

    let summary = driver(&w).run().await.unwrap();

    assert_eq!(summary.totals.clean, 1);
    assert_eq!(w.scanner.call_count(), 2, "one retry was enough");
    assert!(w.destination.join("flaky.bin").exists());
}

#[tokio::test]
async fn exhausted_retries_fail_the_file_and_keep_evidence() {
    let w = world();
    write_source(&w, "cursed.bin", b"never scans");
    w.scanner.set_default(ScanVerdict::Error {
        kind: ScanErrorKind::Unrecognized,
        detail: "exit 2: internal error".to_string(),
    });

    let summary = driver(&w).run().await.unwrap();

    // retry_count = 1 -> first attempt plus one retry
    assert_eq!(w.scanner.call_count(), 2);
    assert_eq!(summary.totals.failed, 1);

    // Quarantine copy retained for post-mortem; source untouched
    assert_eq!(list(&w.quarantine), vec!["cursed.bin".to_string()]);
    assert_eq!(list(&w.source), vec!["cursed.bin".to_string()]);

    let state = today_state(&w);
    let record = state.records.values().next().unwrap();
    assert_eq!(record.outcome, FileOutcome::Failed);
    assert!(record
        .error_reason
        .as_deref()
        .unwrap()
        .contains("internal error"));
}

#[tokio::test]
async fn hanging_scanner_is_cut_off_at_the_deadline() {
    let mut w = world();
    // Tight deadline; the fake "hangs" far beyond it
    w.config.scan_limits.base_timeout = Duration::from_millis(30);
    w.config.scan_limits.retry_count = 1;
    w.config.scan_limits.retry_wait = Duration::from_millis(1);
    w.scanner.set_delay(Duration::from_secs(60));

    write_source(&w, "tarpit.bin", b"scan never returns");

    let started = std::time::Instant::now();
    let summary = driver(&w).run().await.unwrap();

    // Two timeout-bounded attempts, nowhere near the 60s hang
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.totals.failed, 1);

    let state = today_state(&w);
    let record = state.records.values().next().unwrap();
    let timed_out = record
        .scanner_results
        .values()
        .any(|v| matches!(v, ScanVerdict::Error { kind: ScanErrorKind::Timeout, .. }));
    assert!(timed_out, "{:?}", record.scanner_results);
}
