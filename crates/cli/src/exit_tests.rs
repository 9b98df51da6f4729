// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn codes_are_distinct_and_stable() {
    let codes = [
        OK,
        CONFIG_INVALID,
        ALREADY_RUNNING,
        FATAL_IO,
        INTERRUPTED_SHUTDOWN,
        PARTIAL_FAILURE,
    ];
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            assert_ne!(a, b);
        }
    }
    // Frozen contract: schedulers depend on these exact values
    assert_eq!(codes, [0, 2, 3, 4, 5, 6]);
}

#[parameterized(
    completed = { RunStatus::Completed, OK },
    partial = { RunStatus::CompletedWithFailures, PARTIAL_FAILURE },
    interrupted = { RunStatus::Interrupted, INTERRUPTED_SHUTDOWN },
)]
fn status_mapping(status: RunStatus, expected: i32) {
    assert_eq!(for_status(status), expected);
}

#[test]
fn lock_contention_maps_to_already_running() {
    let err = EngineError::Lock(LockError::AlreadyRunning(Some(1234)));
    assert_eq!(for_engine_error(&err), ALREADY_RUNNING);
}

#[test]
fn config_error_maps_to_config_invalid() {
    let err = EngineError::Config("missing paths.source_path".to_string());
    assert_eq!(for_engine_error(&err), CONFIG_INVALID);
}

#[test]
fn io_errors_map_to_fatal_io() {
    let err = EngineError::Workspace {
        path: "/srv/quarantine".into(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert_eq!(for_engine_error(&err), FATAL_IO);
}
