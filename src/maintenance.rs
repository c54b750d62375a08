// ABOUTME: Background sweeper removing expired OAuth states and dead sessions
// ABOUTME: Runs on a tokio interval; failures are logged and retried on the next tick
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::context::AuthContext;
use crate::errors::AuthResult;

/// Counts removed by one maintenance pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// Expired OAuth states deleted
    pub states_removed: usize,
    /// Expired or terminated sessions deleted
    pub sessions_removed: usize,
}

/// Run both sweeps once
///
/// # Errors
///
/// Returns the first storage error encountered
pub async fn run_once(context: &AuthContext) -> AuthResult<MaintenanceReport> {
    let states_removed = context.orchestrator().cleanup_expired_states().await?;
    let sessions_removed = context.sessions().sweep_expired_sessions().await?;
    Ok(MaintenanceReport {
        states_removed,
        sessions_removed,
    })
}

/// Sweep at the context's configured `maintenance_interval`
#[must_use]
pub fn spawn_configured_sweeper(context: AuthContext) -> JoinHandle<()> {
    let interval = context.maintenance_interval();
    spawn_sweeper(context, interval)
}

/// Sweep every `interval` until the returned handle is aborted
#[must_use]
pub fn spawn_sweeper(context: AuthContext, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting maintenance sweeper");
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match run_once(&context).await {
                Ok(report) if report == MaintenanceReport::default() => {
                    debug!("Maintenance pass found nothing to remove");
                }
                Ok(report) => info!(
                    states_removed = report.states_removed,
                    sessions_removed = report.sessions_removed,
                    "Maintenance pass completed"
                ),
                Err(e) => warn!(error = %e, "Maintenance pass failed"),
            }
        }
    })
}
