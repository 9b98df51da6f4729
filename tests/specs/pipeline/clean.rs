// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clean pass-through and destination purity.

use crate::prelude::*;
use shuttle_core::{FileOutcome, ScanVerdict};
use shuttle_engine::fileops;
use shuttle_engine::RunStatus;

#[tokio::test]
async fn clean_file_passes_through_end_to_end() {
    let w = world();
    let content = vec![b'X'; 10_000];
    write_source(&w, "report.pdf", &content);

    let summary = driver(&w).run().await.unwrap();

    // Destination has the file with the source's exact digest
    let delivered = w.destination.join("report.pdf");
    assert!(delivered.exists());
    let state = today_state(&w);
    let record = state.records.values().next().unwrap();
    assert_eq!(
        fileops::hash_file(&delivered).unwrap(),
        record.hash,
        "delivered bytes match the tracked digest"
    );
    assert_eq!(record.outcome, FileOutcome::Success);
    assert_eq!(record.destination_path.as_deref(), Some(delivered.as_path()));

    // Source is empty; tracker shows 1 success, nothing else
    assert!(list(&w.source).is_empty());
    assert_eq!(state.totals.successful.count, 1);
    assert_eq!(state.totals.suspect.count, 0);
    assert_eq!(state.totals.failed.count, 0);
    assert_eq!(summary.status(), RunStatus::Completed);
}

#[tokio::test]
async fn destination_only_ever_holds_success_outcomes() {
    let w = world();
    write_source(&w, "good-1.bin", b"first clean file");
    write_source(&w, "good-2.bin", b"second clean file");
    write_source(&w, "evil.bin", b"malicious payload");
    write_source(&w, "broken.bin", b"unscannable bytes");

    w.scanner.script(
        w.quarantine.join("evil.bin"),
        vec![ScanVerdict::Threat {
            name: "Test.Threat".to_string(),
        }],
    );
    w.scanner.script(
        w.quarantine.join("broken.bin"),
        vec![ScanVerdict::Error {
            kind: shuttle_core::ScanErrorKind::Unrecognized,
            detail: "parse failure".to_string(),
        }],
    );

    driver(&w).run().await.unwrap();

    // Every file in the destination corresponds to a Success record
    // whose scanners never reported a threat
    let state = today_state(&w);
    for rel in tree(&w.destination) {
        let delivered_hash = fileops::hash_file(&w.destination.join(&rel)).unwrap();
        let record = state.records.get(&delivered_hash).unwrap();
        assert_eq!(record.outcome, FileOutcome::Success);
        assert!(
            record.scanner_results.values().all(|v| v.is_clean()),
            "no threat verdict behind a delivered file"
        );
    }

    assert_eq!(tree(&w.destination).len(), 2);
    assert_eq!(state.totals.successful.count, 2);
    assert_eq!(state.totals.suspect.count, 1);
    assert_eq!(state.totals.failed.count, 1);
}

#[tokio::test]
async fn aggregates_always_equal_the_sum_over_records() {
    let w = world();
    write_source(&w, "a.bin", b"aaa");
    write_source(&w, "b.bin", b"bbbbbb");
    write_source(&w, "c.bin", b"ccc ccc ccc");
    w.scanner.script(
        w.quarantine.join("b.bin"),
        vec![ScanVerdict::Threat {
            name: "T".to_string(),
        }],
    );

    driver(&w).run().await.unwrap();

    let state = today_state(&w);
    assert_eq!(state.totals, state.recomputed_totals());
    assert_eq!(
        state.totals.pending.count + state.totals.processed_count(),
        state.records.len() as u64
    );
}
