// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod analytics;
pub mod profile;
pub mod settings;
pub mod social;
pub mod status;

pub use analytics::{
    AdminUser, AdminUserPage, AiAnswer, AnalyticsOverview, BestTimes, DashboardData, Insight,
    PlanUpdate, PlatformMetrics, PostPreview, Recommendation,
};
pub use profile::{Plan, Profile, Role};
pub use settings::{RefreshCheck, Settings};
pub use social::{
    format_number, ConnectionStatus, Connections, InstagramData, Platform, PlatformTotals,
    SocialCacheBlob, UnifiedMetrics, YouTubeData,
};
pub use status::SystemStatus;
