// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suspect isolation: hazard archival and scanner self-quarantine.

use crate::prelude::*;
use shuttle_adapters::Severity;
use shuttle_core::{FileOutcome, ScanVerdict};
use shuttle_engine::RunStatus;

const EICAR: &[u8] =
    br"X5O!P%@AP[4\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

#[tokio::test]
async fn eicar_lands_encrypted_in_the_hazard_archive() {
    let w = world();
    write_source(&w, "eicar.txt", EICAR);
    w.scanner.set_default(ScanVerdict::Threat {
        name: "Eicar-Test-Signature".to_string(),
    });

    let summary = driver(&w).run().await.unwrap();

    // Destination untouched; exactly one ciphertext, forensically named
    assert!(list(&w.destination).is_empty());
    let archived = list(&w.hazard);
    assert_eq!(archived.len(), 1);
    assert!(archived[0].starts_with("eicar.txt_"), "{}", archived[0]);
    assert!(archived[0].ends_with(".gpg"), "{}", archived[0]);

    // No plaintext remains anywhere the pipeline controls
    assert!(list(&w.source).is_empty());
    assert!(list(&w.quarantine).is_empty());

    let state = today_state(&w);
    assert_eq!(state.totals.suspect.count, 1);
    assert_eq!(state.totals.successful.count, 0);
    let record = state.records.values().next().unwrap();
    assert_eq!(record.outcome, FileOutcome::Suspect);
    assert!(record.scanner_results["clamav"].is_threat());

    // A hazard notification at warning severity went out
    let hazard_calls = w.notifier.calls_for_topic("hazard");
    assert_eq!(hazard_calls.len(), 1);
    assert_eq!(hazard_calls[0].severity, Severity::Warning);

    assert_eq!(summary.status(), RunStatus::Completed);
}

#[tokio::test]
async fn defender_self_quarantine_skips_manual_archival() {
    let mut w = world();
    w.config.defender_handles_suspect_files = true;
    // Swap in a defender-named fake that deletes on threat
    w.scanner = shuttle_adapters::FakeScanAdapter::new("defender");
    w.scanner.set_remove_on_threat(true);
    w.scanner.set_default(ScanVerdict::Threat {
        name: "Eicar-Test-Signature".to_string(),
    });
    write_source(&w, "eicar.txt", EICAR);

    driver(&w).run().await.unwrap();

    // Scanner removed the quarantine copy; nothing to encrypt
    assert!(list(&w.hazard).is_empty());
    assert!(w.encryptor.calls().is_empty());
    assert!(list(&w.quarantine).is_empty());
    assert!(list(&w.source).is_empty());

    let state = today_state(&w);
    assert_eq!(state.totals.suspect.count, 1);
}

#[tokio::test]
async fn encryption_failure_never_deletes_the_source() {
    let w = world();
    write_source(&w, "eicar.txt", EICAR);
    w.scanner.set_default(ScanVerdict::Threat {
        name: "Eicar-Test-Signature".to_string(),
    });
    w.encryptor.set_fail(true);

    driver(&w).run().await.unwrap();

    // Quarantine plaintext is gone, but the source copy survives
    assert!(list(&w.quarantine).is_empty());
    assert!(list(&w.hazard).is_empty());
    assert_eq!(list(&w.source), vec!["eicar.txt".to_string()]);

    let state = today_state(&w);
    let record = state.records.values().next().unwrap();
    assert_eq!(record.outcome, FileOutcome::Suspect);
    assert!(record
        .error_reason
        .as_deref()
        .unwrap()
        .contains("encryption failed"));
}
