// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key/value stores standing in for the browser's storage areas.
//!
//! - [`SessionStorage`] lives inside one session and dies with it.
//! - [`UserStore`] is shared by every session of a user. Writes publish a
//!   [`StorageEvent`] that other sessions of the same user observe.
//!
//! Values are stored as JSON text; unreadable values are logged and treated
//! as absent.

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::AppError;
use crate::services::session::SessionId;

/// Session cache blob `{youtube, instagram, timestamp}`.
pub const SOCIAL_CACHE_KEY: &str = "socialleaf_cached_data";
/// Per-platform connection flags.
pub const CONNECTIONS_KEY: &str = "socialleaf_connections";
/// Present once the user finished the connect-accounts step.
pub const ONBOARDING_KEY: &str = "hasConnectedAccounts";
/// Analytics settings (refresh cooldown).
pub const SETTINGS_KEY: &str = "socialleaf_settings";

const EVENT_CHANNEL_CAPACITY: usize = 256;

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable stored value");
            None
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode stored value: {}", e)))
}

// ─── Session storage ─────────────────────────────────────────

/// Storage scoped to one session.
#[derive(Debug, Default)]
pub struct SessionStorage {
    entries: DashMap<String, String>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    pub fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|raw| decode(key, &raw))
    }

    pub fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        self.set(key, encode(value)?);
        Ok(())
    }
}

// ─── User store ──────────────────────────────────────────────

/// Change notification for a user-scoped key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub user_id: String,
    pub key: String,
    /// Session that made the change
    pub origin: SessionId,
}

/// Storage shared by all sessions of a user.
#[derive(Clone)]
pub struct UserStore {
    entries: Arc<DashMap<(String, String), String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(DashMap::new()),
            events,
        }
    }

    pub fn get(&self, user_id: &str, key: &str) -> Option<String> {
        self.entries
            .get(&(user_id.to_string(), key.to_string()))
            .map(|v| v.value().clone())
    }

    pub fn set(&self, user_id: &str, key: &str, value: String, origin: &SessionId) {
        self.entries
            .insert((user_id.to_string(), key.to_string()), value);
        self.publish(user_id, key, origin);
    }

    pub fn remove(&self, user_id: &str, key: &str, origin: &SessionId) {
        if self
            .entries
            .remove(&(user_id.to_string(), key.to_string()))
            .is_some()
        {
            self.publish(user_id, key, origin);
        }
    }

    pub fn read_json<T: DeserializeOwned>(&self, user_id: &str, key: &str) -> Option<T> {
        self.get(user_id, key).and_then(|raw| decode(key, &raw))
    }

    pub fn write_json<T: Serialize>(
        &self,
        user_id: &str,
        key: &str,
        value: &T,
        origin: &SessionId,
    ) -> Result<(), AppError> {
        self.set(user_id, key, encode(value)?, origin);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    fn publish(&self, user_id: &str, key: &str, origin: &SessionId) {
        // No receivers just means no other session is listening.
        let _ = self.events.send(StorageEvent {
            user_id: user_id.to_string(),
            key: key.to_string(),
            origin: origin.clone(),
        });
    }
}
