// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan worker pool.
//!
//! A bounded job channel feeds `max_scan_threads` workers; completions
//! flow back on an unbounded channel so a full job queue can never
//! deadlock against unread completions. Decision rule per file:
//! every configured scanner must report Clean; a Threat anywhere makes
//! the file Suspect; otherwise any scanner error (after retries) makes
//! it Failed. Aggregation priority is Threat > Error > Clean.

use crate::shutdown::ShutdownFlag;
use shuttle_adapters::ScanAdapter;
use shuttle_core::{FileVerdict, ScanVerdict, ScannerResults};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Queue slots per worker before enqueue applies backpressure.
const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Scan timeout and retry policy.
#[derive(Debug, Clone)]
pub struct ScanLimits {
    pub base_timeout: Duration,
    /// Deadline extension per byte of file size
    pub timeout_ms_per_byte: f64,
    pub retry_wait: Duration,
    /// Retries after the first errored attempt
    pub retry_count: u32,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            base_timeout: Duration::from_secs(300),
            timeout_ms_per_byte: 0.0,
            retry_wait: Duration::from_secs(30),
            retry_count: 3,
        }
    }
}

impl ScanLimits {
    /// Per-invocation deadline for a file of the given size.
    pub fn timeout_for(&self, size_bytes: u64) -> Duration {
        let extra_ms = (self.timeout_ms_per_byte * size_bytes as f64) as u64;
        self.base_timeout + Duration::from_millis(extra_ms)
    }
}

/// One quarantined file queued for scanning.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub hash: String,
    pub source_path: PathBuf,
    pub quarantine_path: PathBuf,
    /// Path relative to the source root, preserved on delivery
    pub rel_path: PathBuf,
    pub size_bytes: u64,
}

/// Scan result for one file, consumed by the disposition handler.
#[derive(Debug)]
pub struct ScanCompletion {
    pub job: ScanJob,
    pub verdict: FileVerdict,
    pub results: ScannerResults,
}

/// Handle to the worker pool. Dropping it (or calling [`Self::close`])
/// closes the job queue; workers drain what was queued and exit.
pub struct ScanOrchestrator {
    jobs_tx: mpsc::Sender<ScanJob>,
    workers: Vec<JoinHandle<()>>,
}

impl ScanOrchestrator {
    /// Spawn the pool. Completions arrive on the returned receiver,
    /// which closes once all workers have exited.
    pub fn spawn(
        scanners: Vec<Arc<dyn ScanAdapter>>,
        limits: ScanLimits,
        worker_count: usize,
        shutdown: ShutdownFlag,
    ) -> (Self, mpsc::UnboundedReceiver<ScanCompletion>) {
        let worker_count = worker_count.max(1);
        let (jobs_tx, jobs_rx) = mpsc::channel(worker_count * QUEUE_DEPTH_PER_WORKER);
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let scanners: Arc<[Arc<dyn ScanAdapter>]> = scanners.into();

        let workers = (0..worker_count)
            .map(|worker_id| {
                let jobs_rx = Arc::clone(&jobs_rx);
                let done_tx = done_tx.clone();
                let scanners = Arc::clone(&scanners);
                let limits = limits.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    worker_loop(worker_id, jobs_rx, done_tx, scanners, limits, shutdown).await;
                })
            })
            .collect();

        (Self { jobs_tx, workers }, done_rx)
    }

    /// Queue a file for scanning, waiting for a slot (backpressure).
    /// Returns false if the pool has already shut down.
    pub async fn enqueue(&self, job: ScanJob) -> bool {
        self.jobs_tx.send(job).await.is_ok()
    }

    /// Close the queue and wait for workers to finish in-flight items.
    pub async fn close(self) {
        drop(self.jobs_tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    jobs_rx: Arc<Mutex<mpsc::Receiver<ScanJob>>>,
    done_tx: mpsc::UnboundedSender<ScanCompletion>,
    scanners: Arc<[Arc<dyn ScanAdapter>]>,
    limits: ScanLimits,
    shutdown: ShutdownFlag,
) {
    loop {
        if shutdown.is_set() {
            debug!(worker_id, "worker stopping: shutdown requested");
            break;
        }

        // Only one worker waits on the queue at a time; the lock is
        // released before scanning so scans run in parallel.
        let job = {
            let mut rx = jobs_rx.lock().await;
            tokio::select! {
                job = rx.recv() => job,
                _ = shutdown.wait() => None,
            }
        };

        let Some(job) = job else {
            debug!(worker_id, "worker stopping: queue closed");
            break;
        };

        let completion = scan_file(job, &scanners, &limits, &shutdown).await;
        if done_tx.send(completion).is_err() {
            break;
        }
    }
}

/// Run every configured scanner against one file and fold the verdicts.
async fn scan_file(
    job: ScanJob,
    scanners: &[Arc<dyn ScanAdapter>],
    limits: &ScanLimits,
    shutdown: &ShutdownFlag,
) -> ScanCompletion {
    let timeout = limits.timeout_for(job.size_bytes);
    let mut results = ScannerResults::new();

    for scanner in scanners {
        let verdict =
            scan_with_retry(scanner.as_ref(), &job.quarantine_path, timeout, limits, shutdown)
                .await;
        let is_threat = verdict.is_threat();
        results.insert(scanner.name().to_string(), verdict);
        if is_threat {
            // Threat dominates the aggregate; no need to run the rest
            info!(
                path = %job.quarantine_path.display(),
                scanner = scanner.name(),
                "threat detected"
            );
            break;
        }
    }

    let verdict = FileVerdict::from_results(&results);
    ScanCompletion {
        job,
        verdict,
        results,
    }
}

/// One scanner with the retry policy: errors retry after a backoff,
/// up to `retry_count` times; Threat and Clean are final.
async fn scan_with_retry(
    scanner: &dyn ScanAdapter,
    path: &std::path::Path,
    timeout: Duration,
    limits: &ScanLimits,
    shutdown: &ShutdownFlag,
) -> ScanVerdict {
    let mut verdict = scanner.scan(path, timeout).await;
    let mut attempt = 0;

    while verdict.is_error() && attempt < limits.retry_count && !shutdown.is_set() {
        attempt += 1;
        warn!(
            path = %path.display(),
            scanner = scanner.name(),
            attempt,
            ?verdict,
            "scan errored, retrying"
        );
        tokio::time::sleep(limits.retry_wait).await;
        verdict = scanner.scan(path, timeout).await;
    }

    verdict
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
