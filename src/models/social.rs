// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-platform social payloads and the unified metrics derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::time_utils::epoch_millis;

/// Social platform a user can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Instagram,
    Twitter,
    Linkedin,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Youtube,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Linkedin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
        }
    }

    pub fn parse(value: &str) -> Option<Platform> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Platforms with an analytics feed behind them.
    pub fn has_feed(&self) -> bool {
        matches!(self, Platform::Youtube | Platform::Instagram)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── YouTube ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStatistics {
    #[serde(default)]
    pub subscribers: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub videos: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeChannel {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStatistics {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YouTubeVideo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YouTubeData {
    pub channel: YouTubeChannel,
    #[serde(default)]
    pub recent_videos: Vec<YouTubeVideo>,
}

impl YouTubeData {
    /// Whether the channel title or custom URL contains `hint` (lowercase).
    pub fn matches_hint(&self, hint: &str) -> bool {
        self.channel.title.to_lowercase().contains(hint)
            || self
                .channel
                .custom_url
                .as_deref()
                .is_some_and(|url| url.to_lowercase().contains(hint))
    }

    pub fn totals(&self) -> PlatformTotals {
        let mut totals = PlatformTotals::new(Platform::Youtube);
        for stats in self.recent_videos.iter().filter_map(|v| v.statistics.as_ref()) {
            totals.impressions += stats.views;
            totals.likes += stats.likes;
            totals.comments += stats.comments;
        }
        if let Some(channel) = &self.channel.statistics {
            totals.followers = channel.subscribers;
            totals.posts = channel.videos;
        }
        totals
    }
}

// ─── Instagram ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramProfile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub posts: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramMetrics {
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub posts: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<InstagramProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<InstagramMetrics>,
}

impl InstagramData {
    pub fn totals(&self) -> PlatformTotals {
        let mut totals = PlatformTotals::new(Platform::Instagram);
        if let Some(profile) = &self.profile {
            totals.followers = profile.followers;
            totals.posts = profile.posts;
        }
        if let Some(metrics) = &self.metrics {
            totals.impressions = metrics.impressions;
            if totals.posts == 0 {
                totals.posts = metrics.posts;
            }
        }
        totals
    }
}

// ─── Connections ─────────────────────────────────────────────

/// Connection flag persisted in the user store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<ConnectionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<ConnectionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<ConnectionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<ConnectionStatus>,
}

impl Connections {
    pub fn get(&self, platform: Platform) -> Option<&ConnectionStatus> {
        match platform {
            Platform::Youtube => self.youtube.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
            Platform::Twitter => self.twitter.as_ref(),
            Platform::Linkedin => self.linkedin.as_ref(),
        }
    }

    pub fn set(&mut self, platform: Platform, status: Option<ConnectionStatus>) {
        let slot = match platform {
            Platform::Youtube => &mut self.youtube,
            Platform::Instagram => &mut self.instagram,
            Platform::Twitter => &mut self.twitter,
            Platform::Linkedin => &mut self.linkedin,
        };
        *slot = status;
    }

    pub fn is_connected(&self, platform: Platform) -> bool {
        self.get(platform).is_some_and(|c| c.connected)
    }

    pub fn connected_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.is_connected(*p))
            .collect()
    }
}

// ─── Session cache blob ──────────────────────────────────────

/// Cached payloads stored under the session cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialCacheBlob {
    pub youtube: Option<YouTubeData>,
    pub instagram: Option<InstagramData>,
    /// Epoch milliseconds of the write
    pub timestamp: i64,
}

impl SocialCacheBlob {
    /// Fresh while the blob's age is strictly below `ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age_ms = epoch_millis(now) - self.timestamp;
        age_ms < ttl.as_millis() as i64
    }
}

// ─── Unified metrics ─────────────────────────────────────────

/// Raw counters contributed by one platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformTotals {
    pub platform: Platform,
    pub impressions: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub followers: u64,
    pub posts: u64,
}

impl PlatformTotals {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            impressions: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            followers: 0,
            posts: 0,
        }
    }

    pub fn interactions(&self) -> u64 {
        self.likes + self.comments + self.shares
    }

    pub fn engagement_rate(&self) -> f64 {
        engagement_rate(self.interactions(), self.impressions)
    }
}

/// Cross-platform aggregate over whatever platforms returned data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedMetrics {
    pub impressions: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub followers: u64,
    pub posts: u64,
    /// Impression-weighted engagement rate, in percent
    pub engagement_rate: f64,
    pub platforms: Vec<Platform>,
}

impl UnifiedMetrics {
    pub fn merge(totals: &[PlatformTotals]) -> Self {
        let mut unified = UnifiedMetrics::default();
        for t in totals {
            unified.impressions += t.impressions;
            unified.likes += t.likes;
            unified.comments += t.comments;
            unified.shares += t.shares;
            unified.followers += t.followers;
            unified.posts += t.posts;
            unified.platforms.push(t.platform);
        }
        unified.engagement_rate = engagement_rate(
            unified.likes + unified.comments + unified.shares,
            unified.impressions,
        );
        unified
    }

    pub fn from_payloads(
        youtube: Option<&YouTubeData>,
        instagram: Option<&InstagramData>,
    ) -> Self {
        let totals: Vec<PlatformTotals> = youtube
            .map(YouTubeData::totals)
            .into_iter()
            .chain(instagram.map(InstagramData::totals))
            .collect();
        Self::merge(&totals)
    }
}

fn engagement_rate(interactions: u64, impressions: u64) -> f64 {
    if impressions == 0 {
        return 0.0;
    }
    let rate = interactions as f64 / impressions as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Compact human-readable count: `1_200_000 -> "1.2M"`.
pub fn format_number(num: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for (threshold, suffix) in UNITS {
        if num >= threshold {
            return format!("{:.1}{}", num as f64 / threshold as f64, suffix);
        }
    }
    num.to_string()
}
