// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! System status monitor.
//!
//! Polls the system status on a fixed interval for the lifetime of the
//! gateway and on demand whenever a guarded view is requested. On-demand
//! checks coalesce: while one request is in flight further pokes are no-ops.
//! A failed or timed-out check keeps the last known status.

use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::AppError;
use crate::models::SystemStatus;
use crate::services::backend::BackendClient;
use crate::services::scope::TaskScope;

/// Where system status comes from.
pub trait StatusSource: Send + Sync + 'static {
    fn fetch_status(&self) -> BoxFuture<'_, Result<SystemStatus, AppError>>;
}

impl StatusSource for BackendClient {
    fn fetch_status(&self) -> BoxFuture<'_, Result<SystemStatus, AppError>> {
        Box::pin(self.system_status())
    }
}

/// Latest monitor view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorState {
    /// False until the first check has finished, successfully or not
    pub first_check_done: bool,
    pub status: SystemStatus,
}

pub struct MaintenanceMonitor {
    source: Arc<dyn StatusSource>,
    interval: Duration,
    check_timeout: Duration,
    state: watch::Sender<MonitorState>,
    in_flight: AtomicBool,
    checks: AtomicU64,
}

impl MaintenanceMonitor {
    pub fn new(
        source: Arc<dyn StatusSource>,
        interval: Duration,
        check_timeout: Duration,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(MonitorState::default());
        Arc::new(Self {
            source,
            interval,
            check_timeout,
            state,
            in_flight: AtomicBool::new(false),
            checks: AtomicU64::new(0),
        })
    }

    pub fn state(&self) -> MonitorState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    /// Number of status requests actually sent.
    pub fn checks_performed(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    /// Fetch the status now unless a fetch is already running.
    pub async fn check_now(&self) {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return;
        }
        self.checks.fetch_add(1, Ordering::Relaxed);
        let result = tokio::time::timeout(self.check_timeout, self.source.fetch_status())
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Backend(format!(
                    "status check timed out after {:?}",
                    self.check_timeout
                )))
            });
        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(status) => {
                self.state.send_modify(|state| {
                    if state.status.maintenance_mode != status.maintenance_mode {
                        tracing::info!(
                            maintenance_mode = status.maintenance_mode,
                            "Maintenance mode changed"
                        );
                    }
                    state.status = status;
                    state.first_check_done = true;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "System status check failed");
                self.state.send_modify(|state| state.first_check_done = true);
            }
        }
    }

    /// Fire-and-forget re-check.
    pub fn poke(self: &Arc<Self>, scope: &TaskScope) {
        if self.in_flight.load(Ordering::Acquire) {
            return;
        }
        let monitor = Arc::clone(self);
        scope.spawn(async move { monitor.check_now().await });
    }

    /// Start the periodic poll. The first check runs immediately.
    pub fn start(self: &Arc<Self>, scope: &TaskScope) {
        let monitor = Arc::clone(self);
        scope.spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.check_now().await;
            }
        });
        tracing::info!(interval_secs = self.interval.as_secs(), "Status monitor started");
    }
}
