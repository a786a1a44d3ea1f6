// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Social data aggregator.
//!
//! One [`SocialDataService`] per session. It fetches the YouTube and
//! Instagram payloads, keeps them in a session cache with a short TTL and
//! derives the unified metrics every dashboard view shows. Every read goes
//! through [`SocialDataService::mount`], which refetches once the cache has
//! aged past the TTL.
//!
//! Connection flags live in the user store. A connection change made by
//! another session of the same user triggers a full refresh here; a change
//! made by this session invalidates the cache right away.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::error::AppError;
use crate::models::{
    format_number, ConnectionStatus, Connections, InstagramData, Platform, SocialCacheBlob,
    UnifiedMetrics, YouTubeData,
};
use crate::services::backend::BackendClient;
use crate::services::scope::TaskScope;
use crate::services::session::SessionId;
use crate::services::storage::{
    SessionStorage, StorageEvent, UserStore, CONNECTIONS_KEY, ONBOARDING_KEY, SOCIAL_CACHE_KEY,
};
use crate::time_utils::epoch_millis;

#[derive(Debug, Clone, Default)]
struct SocialState {
    youtube: Option<YouTubeData>,
    instagram: Option<InstagramData>,
    connections: Connections,
    last_fetch: Option<i64>,
}

/// Display strings for the headline counters.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedMetrics {
    pub impressions: String,
    pub likes: String,
    pub comments: String,
    pub followers: String,
    pub posts: String,
    pub engagement_rate: String,
}

impl From<&UnifiedMetrics> for FormattedMetrics {
    fn from(m: &UnifiedMetrics) -> Self {
        Self {
            impressions: format_number(m.impressions),
            likes: format_number(m.likes),
            comments: format_number(m.comments),
            followers: format_number(m.followers),
            posts: format_number(m.posts),
            engagement_rate: format!("{:.2}%", m.engagement_rate),
        }
    }
}

/// Point-in-time view of a session's social data.
#[derive(Debug, Clone, Serialize)]
pub struct SocialSnapshot {
    pub youtube: Option<YouTubeData>,
    pub instagram: Option<InstagramData>,
    pub connections: Connections,
    /// Epoch milliseconds of the last completed fetch
    pub last_fetch: Option<i64>,
    pub unified: UnifiedMetrics,
    pub formatted: FormattedMetrics,
}

pub struct SocialDataService {
    backend: BackendClient,
    user_store: UserStore,
    user_id: String,
    session_id: SessionId,
    storage: Arc<SessionStorage>,
    cache_ttl: Duration,
    featured_hint: String,
    state: RwLock<SocialState>,
    /// Serializes cache-miss loads so concurrent reads fetch once
    loading: Mutex<()>,
}

impl SocialDataService {
    pub fn new(
        backend: BackendClient,
        user_store: UserStore,
        user_id: String,
        session_id: SessionId,
        storage: Arc<SessionStorage>,
        cache_ttl: Duration,
        featured_hint: String,
    ) -> Self {
        Self {
            backend,
            user_store,
            user_id,
            session_id,
            storage,
            cache_ttl,
            featured_hint: featured_hint.to_lowercase(),
            state: RwLock::new(SocialState::default()),
            loading: Mutex::new(()),
        }
    }

    /// Make the session's social data current for a read: reuse a fresh
    /// cache blob, fetch otherwise.
    pub async fn mount(&self) {
        let _loading = self.loading.lock().await;
        if !self.load_cached().await {
            self.refresh_all().await;
        }
    }

    async fn load_cached(&self) -> bool {
        let Some(blob) = self.storage.read_json::<SocialCacheBlob>(SOCIAL_CACHE_KEY) else {
            return false;
        };
        if !blob.is_fresh(Utc::now(), self.cache_ttl) {
            tracing::debug!(user_id = %self.user_id, "Social cache stale");
            return false;
        }

        let connections = self.load_connections();
        let instagram_connected = connections
            .get(Platform::Instagram)
            .is_some_and(|c| c.connected);

        let mut state = self.state.write().await;
        state.youtube = blob.youtube;
        // Disconnected elsewhere since the blob was written
        state.instagram = blob.instagram.filter(|_| instagram_connected);
        state.last_fetch = Some(blob.timestamp);
        state.connections = connections;
        tracing::debug!(user_id = %self.user_id, "Social cache hit");
        true
    }

    /// Reload connections and fetch every platform concurrently.
    ///
    /// The cache and `last_fetch` only move when some fetch produced data.
    pub async fn refresh_all(&self) {
        let connections = self.load_connections();
        let (youtube, instagram) =
            tokio::join!(self.fetch_youtube(), self.fetch_instagram(&connections));
        let fetched = produced(&youtube) || instagram.as_ref().is_some_and(produced);

        let mut state = self.state.write().await;
        state.connections = connections;
        apply(&mut state.youtube, youtube);
        match instagram {
            Some(result) => apply(&mut state.instagram, result),
            None => state.instagram = None,
        }
        if fetched {
            self.record_fetch(&mut state);
        }
    }

    /// Refetch one platform.
    pub async fn refresh_platform(&self, platform: Platform) -> Result<(), AppError> {
        match platform {
            Platform::Youtube => {
                let youtube = self.fetch_youtube().await;
                let fetched = produced(&youtube);
                let mut state = self.state.write().await;
                apply(&mut state.youtube, youtube);
                if fetched {
                    self.record_fetch(&mut state);
                }
                Ok(())
            }
            Platform::Instagram => {
                let connections = self.load_connections();
                let instagram = self.fetch_instagram(&connections).await;
                let fetched = instagram.as_ref().is_some_and(produced);
                let mut state = self.state.write().await;
                state.connections = connections;
                match instagram {
                    Some(result) => apply(&mut state.instagram, result),
                    None => state.instagram = None,
                }
                if fetched {
                    self.record_fetch(&mut state);
                }
                Ok(())
            }
            Platform::Twitter | Platform::Linkedin => Err(AppError::BadRequest(format!(
                "No analytics feed for {}",
                platform
            ))),
        }
    }

    /// Drop the session cache and refetch.
    pub async fn invalidate(&self) {
        self.storage.remove(SOCIAL_CACHE_KEY);
        self.refresh_all().await;
    }

    pub async fn snapshot(&self) -> SocialSnapshot {
        let state = self.state.read().await;
        let unified = UnifiedMetrics::from_payloads(state.youtube.as_ref(), state.instagram.as_ref());
        SocialSnapshot {
            youtube: state.youtube.clone(),
            instagram: state.instagram.clone(),
            connections: state.connections.clone(),
            last_fetch: state.last_fetch,
            formatted: FormattedMetrics::from(&unified),
            unified,
        }
    }

    pub async fn unified(&self) -> UnifiedMetrics {
        let state = self.state.read().await;
        UnifiedMetrics::from_payloads(state.youtube.as_ref(), state.instagram.as_ref())
    }

    pub fn load_connections(&self) -> Connections {
        self.user_store
            .read_json(&self.user_id, CONNECTIONS_KEY)
            .unwrap_or_default()
    }

    /// Whether the connect-accounts prompt was completed or dismissed.
    pub fn onboarding_done(&self) -> bool {
        self.user_store.get(&self.user_id, ONBOARDING_KEY).is_some()
    }

    pub fn mark_onboarding_done(&self) {
        self.user_store
            .set(&self.user_id, ONBOARDING_KEY, "true".to_string(), &self.session_id);
    }

    /// Record a connection change and refetch with the new flags.
    pub async fn update_connection(
        &self,
        platform: Platform,
        status: Option<ConnectionStatus>,
    ) -> Result<Connections, AppError> {
        let mut connections = self.load_connections();
        let connecting = status.as_ref().is_some_and(|s| s.connected);
        connections.set(platform, status);
        self.user_store
            .write_json(&self.user_id, CONNECTIONS_KEY, &connections, &self.session_id)?;
        if connecting {
            self.mark_onboarding_done();
        }

        tracing::info!(
            user_id = %self.user_id,
            platform = %platform,
            connected = connecting,
            "Connection updated"
        );
        self.invalidate().await;
        Ok(connections)
    }

    /// React to connection changes made by the user's other sessions.
    pub fn spawn_listener(self: &Arc<Self>, scope: &TaskScope) {
        let mut events = self.user_store.subscribe();
        let service = Arc::clone(self);
        scope.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if service.is_foreign_connection_change(&event) => {
                        tracing::debug!(user_id = %service.user_id, "Connections changed elsewhere");
                        service.refresh_all().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Storage events dropped, refreshing");
                        service.refresh_all().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn is_foreign_connection_change(&self, event: &StorageEvent) -> bool {
        event.user_id == self.user_id
            && event.key == CONNECTIONS_KEY
            && event.origin != self.session_id
    }

    /// Stamp `last_fetch` and overwrite the session cache.
    fn record_fetch(&self, state: &mut SocialState) {
        let timestamp = epoch_millis(Utc::now());
        state.last_fetch = Some(timestamp);
        let blob = SocialCacheBlob {
            youtube: state.youtube.clone(),
            instagram: state.instagram.clone(),
            timestamp,
        };
        if let Err(e) = self.storage.write_json(SOCIAL_CACHE_KEY, &blob) {
            tracing::warn!(error = %e, "Failed to write social cache");
        }
    }

    async fn fetch_youtube(&self) -> Result<Option<YouTubeData>, AppError> {
        let raw = self.backend.youtube_featured().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch YouTube data");
            e
        })?;
        Ok(select_featured(raw, &self.featured_hint))
    }

    /// `None` when Instagram is not connected.
    async fn fetch_instagram(
        &self,
        connections: &Connections,
    ) -> Option<Result<Option<InstagramData>, AppError>> {
        let status = connections.get(Platform::Instagram).filter(|c| c.connected)?;
        let handle = status.public_handle.as_deref().filter(|h| !h.is_empty());

        let result = match self.backend.instagram(handle).await {
            Ok(data) if data.profile.is_none() && data.metrics.is_none() => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch Instagram data");
                Err(e)
            }
        };
        Some(result)
    }
}

fn produced<T>(fetched: &Result<Option<T>, AppError>) -> bool {
    matches!(fetched, Ok(Some(_)))
}

/// Keep the previous payload unless the fetch produced a new one.
fn apply<T>(slot: &mut Option<T>, fetched: Result<Option<T>, AppError>) {
    if let Ok(Some(value)) = fetched {
        *slot = Some(value);
    }
}

/// Pick the featured channel out of `/api/youtube/featured`.
///
/// An array yields the first entry matching `hint`, else the first entry.
/// A single object is used when it has a `channel`.
pub fn select_featured(raw: serde_json::Value, hint: &str) -> Option<YouTubeData> {
    match raw {
        serde_json::Value::Array(items) => {
            let channels: Vec<YouTubeData> = items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect();
            let index = channels
                .iter()
                .position(|c| c.matches_hint(hint))
                .unwrap_or(0);
            channels.into_iter().nth(index)
        }
        value @ serde_json::Value::Object(_) if value.get("channel").is_some() => {
            serde_json::from_value(value).ok()
        }
        _ => None,
    }
}
