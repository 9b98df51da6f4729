// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline driver: one complete run.
//!
//! Sequence: lock → tracker → discover → (stability, admission,
//! quarantine, register, enqueue) per candidate → drain scans →
//! dispose → close tracker → prune → summary → unlock. Per-file
//! failures never abort the run; they become Failed records.
//!
//! The driver is the only writer to the tracker. Scan workers send
//! completions back on a channel and never touch shared state.

use crate::config::RunConfig;
use crate::discovery;
use crate::disposition::{DispositionHandler, DispositionPolicy};
use crate::error::EngineError;
use crate::fileops;
use crate::lock::InstanceLock;
use crate::orchestrator::{ScanCompletion, ScanJob, ScanOrchestrator};
use crate::report::{RunSummary, RunTotals};
use crate::shutdown::ShutdownFlag;
use crate::throttle::Throttler;
use shuttle_adapters::{EncryptAdapter, NotifyAdapter, ScanAdapter, Severity, SpaceProbe};
use shuttle_core::{Clock, FileOutcome};
use shuttle_storage::{DailyProcessingTracker, RegisterOutcome, INTERRUPTED_REASON};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Extra time past the per-file scan deadline before an interrupted
/// drain gives up on in-flight workers.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Composed pipeline with injected capabilities.
pub struct PipelineDriver<E, N, P, C>
where
    E: EncryptAdapter,
    N: NotifyAdapter,
    P: SpaceProbe,
    C: Clock,
{
    config: RunConfig,
    scanners: Vec<Arc<dyn ScanAdapter>>,
    encryptor: E,
    notifier: N,
    probe: P,
    clock: C,
    shutdown: ShutdownFlag,
}

impl<E, N, P, C> PipelineDriver<E, N, P, C>
where
    E: EncryptAdapter,
    N: NotifyAdapter,
    P: SpaceProbe,
    C: Clock,
{
    pub fn new(
        config: RunConfig,
        scanners: Vec<Arc<dyn ScanAdapter>>,
        encryptor: E,
        notifier: N,
        probe: P,
        clock: C,
    ) -> Self {
        Self {
            config,
            scanners,
            encryptor,
            notifier,
            probe,
            clock,
            shutdown: ShutdownFlag::new(),
        }
    }

    /// Flag for signal handlers; setting it stops admission and drains
    /// in-flight work.
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Execute one run to completion.
    pub async fn run(self) -> Result<RunSummary, EngineError> {
        let PipelineDriver {
            config,
            scanners,
            encryptor,
            notifier,
            probe,
            clock,
            shutdown,
        } = self;

        let started_at = clock.now();
        let mut run_id = Uuid::new_v4().to_string();
        run_id.truncate(8);

        let lock = InstanceLock::acquire(&config.lock_path, started_at)?;
        let mut tracker = DailyProcessingTracker::open(config.tracking_dir.clone(), clock.clone())?;

        for dir in [&config.quarantine_root, &config.destination_root] {
            std::fs::create_dir_all(dir).map_err(|source| EngineError::Workspace {
                path: dir.clone(),
                source,
            })?;
        }
        if let Some(hazard) = &config.hazard {
            std::fs::create_dir_all(&hazard.archive_root).map_err(|source| {
                EngineError::Workspace {
                    path: hazard.archive_root.clone(),
                    source,
                }
            })?;
        }

        let candidates =
            discovery::discover(&config.source_root).map_err(|source| {
                EngineError::SourceUnreadable {
                    path: config.source_root.clone(),
                    source,
                }
            })?;
        info!(run_id, count = candidates.len(), "discovered candidates");

        let (orchestrator, mut completions) = ScanOrchestrator::spawn(
            scanners,
            config.scan_limits.clone(),
            config.max_scan_threads,
            shutdown.clone(),
        );
        let mut throttler = Throttler::new(config.throttle.clone(), probe);
        let disposition = DispositionHandler::new(
            DispositionPolicy {
                destination_root: config.destination_root.clone(),
                hazard: config.hazard.clone(),
                delete_source_files: config.delete_source_files,
                defender_handles_suspect_files: config.defender_handles_suspect_files,
            },
            encryptor,
            clock.clone(),
        );

        let mut working_dirs: Vec<&Path> =
            vec![&config.quarantine_root, &config.destination_root];
        if let Some(hazard) = &config.hazard {
            working_dirs.push(&hazard.archive_root);
        }

        let mut totals = RunTotals {
            discovered: candidates.len(),
            ..RunTotals::default()
        };
        let mut refusals: Vec<String> = Vec::new();
        let mut max_admitted_size: u64 = 0;
        // Hashes enqueued this run, so identical content discovered
        // under a second path is not scanned twice
        let mut enqueued: HashSet<String> = HashSet::new();

        for candidate in candidates {
            // Keep the tracker fresh while admission proceeds
            while let Ok(completion) = completions.try_recv() {
                handle_completion(
                    completion,
                    &disposition,
                    &mut tracker,
                    &notifier,
                    config.notify,
                    &mut totals,
                )
                .await?;
            }

            if shutdown.is_set() {
                info!("shutdown requested, stopping admission");
                break;
            }

            if !fileops::is_file_stable(
                &candidate.path,
                config.stability.probe_interval,
                config.stability.samples,
            )
            .await
            {
                debug!(path = %candidate.path.display(), "not stable yet, leaving for next run");
                totals.skipped_unstable += 1;
                continue;
            }

            let snapshot = tracker.snapshot()?;
            if let Err(reason) = throttler.admit(candidate.size_bytes, &working_dirs, &snapshot) {
                warn!(%reason, path = %candidate.path.display(), "admission refused, stopping intake");
                if config.notify && throttler.first_refusal(&reason) {
                    notify_quiet(&notifier, Severity::Warning, "throttle", &reason.to_string())
                        .await;
                }
                refusals.push(reason.to_string());
                break;
            }

            let quarantine_path = config.quarantine_root.join(&candidate.rel_path);
            let (size_bytes, hash) =
                match fileops::copy_with_hash(&candidate.path, &quarantine_path) {
                    Ok(copied) => copied,
                    Err(e) => {
                        warn!(path = %candidate.path.display(), error = %e, "quarantine copy failed");
                        totals.failed += 1;
                        continue;
                    }
                };

            match &tracker.register(
                &hash,
                candidate.path.clone(),
                quarantine_path.clone(),
                size_bytes,
            )? {
                RegisterOutcome::AlreadyCompleted(record) => {
                    debug!(
                        path = %candidate.path.display(),
                        hash = %record.hash_prefix(),
                        outcome = %record.outcome,
                        "content already processed today"
                    );
                    totals.skipped_duplicate += 1;
                    fileops::remove_quarantine_copy(&quarantine_path);
                    if record.outcome == FileOutcome::Success && config.delete_source_files {
                        if let Err(e) = fileops::safe_delete(&candidate.path, &hash) {
                            warn!(path = %candidate.path.display(), error = %e, "duplicate source not removed");
                        }
                    }
                    continue;
                }
                RegisterOutcome::ResumedPending(record) if enqueued.contains(&hash) => {
                    debug!(
                        path = %candidate.path.display(),
                        hash = %record.hash_prefix(),
                        "identical content already queued this run"
                    );
                    totals.skipped_duplicate += 1;
                    if quarantine_path != record.quarantine_path {
                        fileops::remove_quarantine_copy(&quarantine_path);
                    }
                    continue;
                }
                RegisterOutcome::Fresh(_) | RegisterOutcome::ResumedPending(_) => {}
            }

            enqueued.insert(hash.clone());
            totals.admitted += 1;
            max_admitted_size = max_admitted_size.max(size_bytes);
            let job = ScanJob {
                hash,
                source_path: candidate.path,
                quarantine_path,
                rel_path: candidate.rel_path,
                size_bytes,
            };
            if !orchestrator.enqueue(job).await {
                warn!("scan queue closed, stopping intake");
                break;
            }
        }

        // Close the queue and wait for workers. On shutdown the wait is
        // bounded: in-flight scans abandon retries and hit their own
        // deadlines.
        let close = orchestrator.close();
        if shutdown.is_set() {
            let deadline = config.scan_limits.timeout_for(max_admitted_size) + SHUTDOWN_GRACE;
            if tokio::time::timeout(deadline, close).await.is_err() {
                warn!("scan workers still running at shutdown deadline");
            }
        } else {
            close.await;
        }

        while let Ok(completion) = completions.try_recv() {
            handle_completion(
                completion,
                &disposition,
                &mut tracker,
                &notifier,
                config.notify,
                &mut totals,
            )
            .await?;
        }

        let interrupted = shutdown.is_set();
        let closed = tracker.close(INTERRUPTED_REASON)?;
        totals.interrupted_pending = closed.len();
        if !closed.is_empty() {
            warn!(
                count = closed.len(),
                "pending records closed as interrupted"
            );
        }

        let pruned = fileops::prune_empty_dirs(&config.source_root);
        if pruned > 0 {
            info!(pruned, "pruned empty source directories");
        }

        let day = tracker.snapshot()?;
        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: clock.now(),
            totals,
            day,
            refusals,
            interrupted,
        };

        if config.notify_summary {
            notify_quiet(&notifier, Severity::Info, "summary", &summary.body()).await;
        }

        info!(
            run_id = %summary.run_id,
            clean = totals.clean,
            suspect = totals.suspect,
            failed = totals.failed,
            status = ?summary.status(),
            "run complete"
        );

        lock.release();
        Ok(summary)
    }
}

/// Apply the disposition for one scanned file and record the outcome.
async fn handle_completion<E, N, C>(
    completion: ScanCompletion,
    disposition: &DispositionHandler<E, C>,
    tracker: &mut DailyProcessingTracker<C>,
    notifier: &N,
    notify: bool,
    totals: &mut RunTotals,
) -> Result<(), EngineError>
where
    E: EncryptAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let ScanCompletion {
        job,
        verdict,
        results,
    } = completion;

    let disposed = disposition.handle(&job, verdict, &results).await;
    match disposed.outcome {
        FileOutcome::Success => totals.clean += 1,
        FileOutcome::Suspect => totals.suspect += 1,
        FileOutcome::Failed => totals.failed += 1,
        FileOutcome::Unknown => {}
    }

    if notify && disposed.outcome == FileOutcome::Suspect {
        let body = format!(
            "suspect file {} (hash {})",
            job.source_path.display(),
            job.hash
        );
        notify_quiet(notifier, Severity::Warning, "hazard", &body).await;
    }

    tracker.complete(
        &job.hash,
        disposed.outcome,
        disposed.destination_path,
        disposed.error_reason,
        results,
    )?;
    Ok(())
}

/// Notifications are best-effort: failures are logged, never raised.
async fn notify_quiet<N: NotifyAdapter>(notifier: &N, severity: Severity, topic: &str, body: &str) {
    if let Err(e) = notifier.notify(severity, topic, body).await {
        warn!(topic, error = %e, "notification failed");
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
