// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SocialLeaf Gateway: backend-for-frontend for the SocialLeaf web client
//!
//! This crate guards the client's views, gates plan features, aggregates
//! social platform data per session and exports reports, talking to the
//! SocialLeaf REST API on the user's behalf.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{
    BackendClient, MaintenanceMonitor, SessionStore, SocialConfig, TaskScope, UserStore,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub sessions: Arc<SessionStore>,
    pub user_store: UserStore,
    pub monitor: Arc<MaintenanceMonitor>,
    /// Owns the status poll, on-demand status checks and the session sweep
    pub background: TaskScope,
}

impl AppState {
    /// Wire up services from `config`. Background work is not started.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backend = BackendClient::new(&config.api_base_url, config.api_timeout)?;
        let user_store = UserStore::new();
        let sessions = Arc::new(SessionStore::new(
            backend.clone(),
            user_store.clone(),
            SocialConfig {
                cache_ttl: config.social_cache_ttl,
                featured_channel: config.featured_channel.clone(),
            },
            config.session_ttl(),
        ));
        let monitor = MaintenanceMonitor::new(
            Arc::new(backend.clone()),
            config.maintenance_poll_interval,
            config.api_timeout,
        );

        Ok(Self {
            config,
            backend,
            sessions,
            user_store,
            monitor,
            background: TaskScope::new("gateway"),
        })
    }

    /// Start the status poll and the expired-session sweep.
    pub fn start_background(&self) {
        self.monitor.start(&self.background);
        self.sessions
            .start_sweeper(&self.background, self.config.session_sweep_interval);
    }

    /// Close every session and background task.
    pub fn shutdown(&self) {
        self.sessions.close_all();
        self.background.close();
    }
}
