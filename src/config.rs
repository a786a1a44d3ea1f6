// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gateway configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Gateway configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the SocialLeaf REST API
    pub api_base_url: String,
    /// Frontend URL for CORS and cookie attributes
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// HS256 key for session cookies (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Session cookie lifetime in days
    pub session_ttl_days: i64,
    /// Interval between system status polls
    pub maintenance_poll_interval: Duration,
    /// Age after which the session social cache is stale
    pub social_cache_ttl: Duration,
    /// Substring that selects the featured YouTube channel
    pub featured_channel: String,
    /// Per-request timeout for SocialLeaf API calls
    pub api_timeout: Duration,
    /// Interval between sweeps of expired sessions
    pub session_sweep_interval: Duration,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            session_signing_key: b"test_session_key_32_bytes_long!!".to_vec(),
            session_ttl_days: 7,
            maintenance_poll_interval: Duration::from_secs(30),
            social_cache_ttl: Duration::from_secs(5 * 60),
            featured_channel: "mrbeast".to_string(),
            api_timeout: Duration::from_secs(5),
            session_sweep_interval: Duration::from_secs(10 * 60),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080),
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            session_ttl_days: parse_or("SESSION_TTL_DAYS", 7),
            maintenance_poll_interval: Duration::from_secs(parse_or("MAINTENANCE_POLL_SECS", 30)),
            social_cache_ttl: Duration::from_secs(parse_or("SOCIAL_CACHE_TTL_SECS", 300)),
            featured_channel: env::var("FEATURED_CHANNEL")
                .unwrap_or_else(|_| "mrbeast".to_string())
                .to_lowercase(),
            api_timeout: Duration::from_secs(parse_or("API_TIMEOUT_SECS", 10)),
            session_sweep_interval: Duration::from_secs(parse_or("SESSION_SWEEP_SECS", 600)),
        })
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }

    /// Server-side session lifetime, matching the cookie.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_days.max(1) as u64 * 24 * 60 * 60)
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
