// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared world-building for the behavioral specs.

use chrono::{Local, TimeZone};
use shuttle_adapters::{FakeEncryptAdapter, FakeNotifyAdapter, FakeScanAdapter, FakeSpaceProbe};
use shuttle_core::FakeClock;
use shuttle_engine::disposition::HazardConfig;
use shuttle_engine::{PipelineDriver, RunConfig, ScanLimits, StabilityConfig, ThrottleConfig};
use shuttle_storage::{day_file, DayState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const MB: u64 = 1024 * 1024;

/// One isolated shuttle installation with fake collaborators.
pub struct World {
    pub _dir: TempDir,
    pub source: PathBuf,
    pub quarantine: PathBuf,
    pub destination: PathBuf,
    pub hazard: PathBuf,
    pub state: PathBuf,
    pub config: RunConfig,
    pub scanner: FakeScanAdapter,
    pub encryptor: FakeEncryptAdapter,
    pub notifier: FakeNotifyAdapter,
    pub probe: FakeSpaceProbe,
    pub clock: FakeClock,
}

pub fn world() -> World {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in");
    let quarantine = dir.path().join("quarantine");
    let destination = dir.path().join("out");
    let hazard = dir.path().join("hazard");
    let state = dir.path().join("state");
    std::fs::create_dir_all(&source).unwrap();

    let key = dir.path().join("hazard.pub");
    std::fs::write(&key, b"public key material").unwrap();

    let config = RunConfig {
        source_root: source.clone(),
        quarantine_root: quarantine.clone(),
        destination_root: destination.clone(),
        hazard: Some(HazardConfig {
            archive_root: hazard.clone(),
            public_key: key,
        }),
        tracking_dir: state.clone(),
        lock_path: state.join("shuttle.pid"),
        delete_source_files: true,
        defender_handles_suspect_files: false,
        max_scan_threads: 2,
        throttle: ThrottleConfig::default(),
        scan_limits: ScanLimits {
            base_timeout: Duration::from_secs(5),
            timeout_ms_per_byte: 0.0,
            retry_wait: Duration::from_millis(5),
            retry_count: 1,
        },
        stability: StabilityConfig {
            probe_interval: Duration::from_millis(2),
            samples: 2,
        },
        notify: true,
        notify_summary: false,
    };

    let probe = FakeSpaceProbe::new();
    for root in [&quarantine, &destination, &hazard] {
        probe.set_free(root, 1_000_000 * MB);
    }

    World {
        _dir: dir,
        source,
        quarantine,
        destination,
        hazard,
        state,
        config,
        scanner: FakeScanAdapter::new("clamav"),
        encryptor: FakeEncryptAdapter::new(),
        notifier: FakeNotifyAdapter::new(),
        probe,
        clock: FakeClock::new(Local.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()),
    }
}

pub type SpecDriver =
    PipelineDriver<FakeEncryptAdapter, FakeNotifyAdapter, FakeSpaceProbe, FakeClock>;

pub fn driver(w: &World) -> SpecDriver {
    PipelineDriver::new(
        w.config.clone(),
        vec![Arc::new(w.scanner.clone())],
        w.encryptor.clone(),
        w.notifier.clone(),
        w.probe.clone(),
        w.clock.clone(),
    )
}

pub fn write_source(w: &World, rel: &str, content: &[u8]) {
    let path = w.source.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Today's persisted tracker state.
pub fn today_state(w: &World) -> DayState {
    let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    day_file::load(&day_file::state_file_path(&w.state, date))
        .unwrap()
        .unwrap()
}

/// Sorted file names directly under a directory (empty if absent).
pub fn list(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Recursively collect relative paths of all files under a root.
pub fn tree(root: &Path) -> Vec<PathBuf> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}
