// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use tempfile::tempdir;

fn now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 3, 14, 6, 0, 0).unwrap()
}

#[test]
fn acquire_writes_pid_and_timestamp() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shuttle.pid");

    let lock = InstanceLock::acquire(&path, now()).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let mut parts = contents.split_whitespace();
    assert_eq!(
        parts.next().unwrap().parse::<u32>().unwrap(),
        std::process::id()
    );
    assert!(parts.next().unwrap().starts_with("2026-03-14"));
    drop(lock);
}

#[test]
fn second_acquire_fails_while_held() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shuttle.pid");

    let held = InstanceLock::acquire(&path, now()).unwrap();

    let err = InstanceLock::acquire(&path, now()).unwrap_err();
    let LockError::AlreadyRunning(pid) = err else {
        panic!("expected AlreadyRunning");
    };
    // The recorded holder is this process, which is alive
    assert_eq!(pid, Some(std::process::id()));
    drop(held);
}

#[test]
fn lock_is_reacquirable_after_release() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shuttle.pid");

    let first = InstanceLock::acquire(&path, now()).unwrap();
    first.release();
    assert!(!path.exists(), "release removes the lock file");

    let second = InstanceLock::acquire(&path, now()).unwrap();
    drop(second);
}

#[test]
fn leftover_unlocked_file_is_taken_over() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shuttle.pid");

    // A lock file from a crashed run: PID present but no OS lock held
    fs::write(&path, "999999999 2026-01-01T00:00:00+0000\n").unwrap();

    let lock = InstanceLock::acquire(&path, now()).unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with(&std::process::id().to_string()));
    drop(lock);
}

#[test]
fn acquire_creates_missing_parent_dirs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state/locks/shuttle.pid");
    let lock = InstanceLock::acquire(&path, now()).unwrap();
    assert!(path.exists());
    drop(lock);
}
