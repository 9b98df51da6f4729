// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn small_log_is_not_rotated() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("shuttle.log");
    std::fs::write(&log, b"a few lines").unwrap();

    rotate_log_if_needed(&log);

    assert!(log.exists());
    assert!(!dir.path().join("shuttle.log.1").exists());
}

#[test]
fn oversized_log_rotates_and_evicts_oldest() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("shuttle.log");
    let big = vec![b'x'; MAX_LOG_SIZE as usize];

    // Pre-existing rotations .1 .2 .3
    std::fs::write(format!("{}.1", log.display()), b"one").unwrap();
    std::fs::write(format!("{}.2", log.display()), b"two").unwrap();
    std::fs::write(format!("{}.3", log.display()), b"three").unwrap();
    std::fs::write(&log, &big).unwrap();

    rotate_log_if_needed(&log);

    assert!(!log.exists(), "current log moved aside");
    assert_eq!(
        std::fs::read(format!("{}.1", log.display())).unwrap(),
        big,
        "current became .1"
    );
    assert_eq!(
        std::fs::read(format!("{}.2", log.display())).unwrap(),
        b"one"
    );
    assert_eq!(
        std::fs::read(format!("{}.3", log.display())).unwrap(),
        b"two"
    );
    // Old .3 was evicted
}

#[test]
fn missing_log_is_a_noop() {
    let dir = tempdir().unwrap();
    rotate_log_if_needed(&dir.path().join("absent.log"));
}
