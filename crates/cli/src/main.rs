// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! shuttle: move files from an untrusted source to a trusted
//! destination, via quarantine and antivirus scanning.
//!
//! Designed for unattended cron execution: a single instance per host,
//! distinct exit codes per failure class, and all state under the
//! tracking directory.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
mod exit;
mod logging;
mod notifier;

use args::CliArgs;
use clap::Parser;
use notifier::CliNotifier;
use shuttle_adapters::{
    ClamAvAdapter, DefenderAdapter, DiskSpaceProbe, GpgEncryptAdapter, NotifyAdapter, ScanAdapter,
    Severity,
};
use shuttle_config::ShuttleConfig;
use shuttle_core::SystemClock;
use shuttle_engine::{PipelineDriver, RunConfig};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let code = run().await;
    std::process::exit(code);
}

async fn run() -> i32 {
    let cli = CliArgs::parse();

    let overrides = match cli.overrides() {
        Ok(overrides) => overrides,
        Err(e) => {
            eprintln!("shuttle: {e}");
            return exit::CONFIG_INVALID;
        }
    };

    let config = match ShuttleConfig::resolve(cli.config.as_deref(), &overrides, false) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("shuttle: {e}");
            return exit::CONFIG_INVALID;
        }
    };

    let _log_guard = match logging::init(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("shuttle: cannot set up logging: {e:#}");
            return exit::FATAL_IO;
        }
    };

    let run_config = match RunConfig::from_settings(&config) {
        Ok(run_config) => run_config,
        Err(e) => {
            eprintln!("shuttle: {e}");
            error!(error = %e, "invalid configuration");
            return exit::CONFIG_INVALID;
        }
    };

    let mut scanners: Vec<Arc<dyn ScanAdapter>> = Vec::new();
    if config.settings.on_demand_defender {
        scanners.push(Arc::new(DefenderAdapter::new()));
    }
    if config.settings.on_demand_clam_av {
        scanners.push(Arc::new(ClamAvAdapter::new()));
    }

    let notify_enabled = config.notifications.notify;
    let notifier = CliNotifier::from_config(&config.notifications);

    let driver = PipelineDriver::new(
        run_config,
        scanners,
        GpgEncryptAdapter::new(),
        notifier.clone(),
        DiskSpaceProbe::new(),
        SystemClock,
    );

    if let Err(e) = install_signal_handlers(&driver) {
        eprintln!("shuttle: cannot install signal handlers: {e}");
        return exit::FATAL_IO;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "shuttle starting");

    match driver.run().await {
        Ok(summary) => {
            let status = summary.status();
            info!(?status, "shuttle finished");
            exit::for_status(status)
        }
        Err(e) => {
            error!(error = %e, "run aborted");
            eprintln!("shuttle: {e}");
            if notify_enabled {
                if let Err(notify_err) = notifier
                    .notify(Severity::Error, "run-failed", &e.to_string())
                    .await
                {
                    error!(error = %notify_err, "failure notification not sent");
                }
            }
            exit::for_engine_error(&e)
        }
    }
}

/// SIGINT/SIGTERM set the shared shutdown flag; the driver stops
/// admitting files and drains in-flight work.
fn install_signal_handlers<E, N, P, C>(
    driver: &PipelineDriver<E, N, P, C>,
) -> std::io::Result<()>
where
    E: shuttle_adapters::EncryptAdapter,
    N: NotifyAdapter,
    P: shuttle_adapters::SpaceProbe,
    C: shuttle_core::Clock,
{
    let shutdown = driver.shutdown_flag();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
        shutdown.set();
    });

    Ok(())
}
