// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/profile provider.
//!
//! A [`Session`] is created at sign-in from the identity provider's access
//! token and owns everything scoped to one signed-in browser: the bearer
//! token, the profile, session storage, the social data service and the
//! background tasks working on its behalf. Sign-out removes it from the
//! [`SessionStore`] and closes its task scope. Sessions also expire with
//! their cookie: lookups drop expired entries and a periodic sweep collects
//! the rest.

use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::AppError;
use crate::models::{Plan, Profile, Role};
use crate::services::backend::BackendClient;
use crate::services::scope::TaskScope;
use crate::services::social::SocialDataService;
use crate::services::storage::{SessionStorage, UserStore};

/// Random session identifier carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// 256 random bits, hex encoded.
    pub fn generate(rng: &SystemRandom) -> Result<Self, AppError> {
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Random generation failed")))?;
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role and plan the route guard needs from a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFacts {
    pub role: Role,
    pub plan: Option<Plan>,
    /// False while a profile reload is in progress
    pub resolved: bool,
}

/// One signed-in browser session.
pub struct Session {
    id: SessionId,
    access_token: String,
    user_id: String,
    profile: RwLock<Profile>,
    /// Profile reloads in flight
    reloads: AtomicUsize,
    expires_at: Instant,
    pub storage: Arc<SessionStorage>,
    pub social: Arc<SocialDataService>,
    scope: TaskScope,
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Bearer credential forwarded to the SocialLeaf API.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn profile(&self) -> Profile {
        self.profile.read().await.clone()
    }

    pub async fn facts(&self) -> SessionFacts {
        let profile = self.profile.read().await;
        SessionFacts {
            role: profile.role,
            plan: profile.plan,
            resolved: self.reloads.load(Ordering::Acquire) == 0,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Background tasks spawned here die with the session.
    pub fn scope(&self) -> &TaskScope {
        &self.scope
    }

    /// Reload the profile after a server-side mutation.
    ///
    /// On failure the previous profile is kept.
    pub async fn refresh_profile(&self, backend: &BackendClient) -> Result<Profile, AppError> {
        let result = {
            let _reload = ReloadGuard::enter(&self.reloads);
            backend.current_user(&self.access_token).await
        };

        let fresh = match result {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Profile refresh failed");
                return Err(e);
            }
        };

        if fresh.id != self.user_id {
            return Err(AppError::InvalidToken);
        }

        *self.profile.write().await = fresh.clone();
        tracing::debug!(
            user_id = %self.user_id,
            plan = ?fresh.plan,
            "Profile refreshed"
        );
        Ok(fresh)
    }

    fn teardown(&self) {
        self.scope.close();
        self.storage.clear();
    }
}

/// Counts one in-flight reload; released on drop so a cancelled reload
/// cannot leave the session unresolved.
struct ReloadGuard<'a>(&'a AtomicUsize);

impl<'a> ReloadGuard<'a> {
    fn enter(reloads: &'a AtomicUsize) -> Self {
        reloads.fetch_add(1, Ordering::AcqRel);
        Self(reloads)
    }
}

impl Drop for ReloadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Social settings every new session is built with.
#[derive(Debug, Clone)]
pub struct SocialConfig {
    pub cache_ttl: Duration,
    pub featured_channel: String,
}

/// Table of live sessions.
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<Session>>,
    backend: BackendClient,
    user_store: UserStore,
    social: SocialConfig,
    session_ttl: Duration,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new(
        backend: BackendClient,
        user_store: UserStore,
        social: SocialConfig,
        session_ttl: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            backend,
            user_store,
            social,
            session_ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Validate `access_token` against the API and open a session for its
    /// owner.
    pub async fn sign_in(&self, access_token: &str) -> Result<Arc<Session>, AppError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(AppError::BadRequest("access_token is required".to_string()));
        }

        let profile = match self.backend.current_user(access_token).await {
            Ok(profile) => profile,
            Err(e) if e.is_backend_auth_error() => return Err(AppError::InvalidToken),
            Err(e) => return Err(e),
        };

        let id = SessionId::generate(&self.rng)?;
        let storage = Arc::new(SessionStorage::new());
        let social = Arc::new(SocialDataService::new(
            self.backend.clone(),
            self.user_store.clone(),
            profile.id.clone(),
            id.clone(),
            storage.clone(),
            self.social.cache_ttl,
            self.social.featured_channel.clone(),
        ));

        let session = Arc::new(Session {
            id: id.clone(),
            access_token: access_token.to_string(),
            user_id: profile.id.clone(),
            profile: RwLock::new(profile),
            reloads: AtomicUsize::new(0),
            expires_at: Instant::now() + self.session_ttl,
            storage,
            social,
            scope: TaskScope::new("session"),
        });
        session.social.spawn_listener(&session.scope);

        self.sessions.insert(id, session.clone());
        tracing::info!(
            user_id = %session.user_id,
            live_sessions = self.sessions.len(),
            "Session opened"
        );
        Ok(session)
    }

    /// Live session for `id`. An expired session is closed instead.
    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        if session.is_expired(Instant::now()) {
            self.expire(id);
            return None;
        }
        Some(session)
    }

    fn expire(&self, id: &SessionId) {
        if let Some((_, session)) = self
            .sessions
            .remove_if(id, |_, session| session.is_expired(Instant::now()))
        {
            session.teardown();
            tracing::info!(user_id = %session.user_id, "Session expired");
        }
    }

    /// Close every expired session; returns how many were closed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        for id in &expired {
            self.expire(id);
        }
        if !expired.is_empty() {
            tracing::info!(
                expired = expired.len(),
                live_sessions = self.sessions.len(),
                "Swept expired sessions"
            );
        }
        expired.len()
    }

    /// Sweep expired sessions every `interval` on `scope`.
    pub fn start_sweeper(self: &Arc<Self>, scope: &TaskScope, interval: Duration) {
        let store = Arc::clone(self);
        scope.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.sweep_expired();
            }
        });
    }

    /// Tear the session down. Unknown ids are ignored.
    pub fn sign_out(&self, id: &SessionId) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.teardown();
                tracing::info!(user_id = %session.user_id, "Session closed");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session (shutdown).
    pub fn close_all(&self) {
        for entry in self.sessions.iter() {
            entry.value().teardown();
        }
        self.sessions.clear();
    }
}
