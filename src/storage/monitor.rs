// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Health Monitor
//!
//! Background task that periodically pings the record database through the
//! configured retry policy and logs reachability transitions.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::VaultDatabase;

/// Default interval between health checks.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic database liveness checker.
pub struct HealthMonitor {
    database: Arc<VaultDatabase>,
    interval: Duration,
}

impl HealthMonitor {
    /// Create a new monitor for the given database.
    pub fn new(database: Arc<VaultDatabase>) -> Self {
        Self {
            database,
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the monitor loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(monitor.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Storage health monitor starting"
        );

        let mut healthy = true;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Storage health monitor shutting down");
                    return;
                }
            }

            healthy = self.check_step(healthy).await;
        }
    }

    /// Run one check and return the new health state.
    async fn check_step(&self, was_healthy: bool) -> bool {
        match self.database.ping().await {
            Ok(()) => {
                if !was_healthy {
                    info!("Storage health monitor: database reachable again");
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "Storage health monitor: database unreachable");
                false
            }
        }
    }
}
