// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics, AI, and admin payloads exchanged with the SocialLeaf API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::profile::{Plan, Role};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    #[serde(default)]
    pub total_impressions: u64,
    #[serde(default)]
    pub engagement_rate: f64,
    #[serde(default)]
    pub total_comments: u64,
    #[serde(default)]
    pub total_shares: u64,
    #[serde(default)]
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformMetrics {
    pub platform: String,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

/// Best posting slots: platform -> weekday -> time ranges.
pub type BestTimes = HashMap<String, HashMap<String, Vec<String>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub overview: AnalyticsOverview,
    #[serde(default)]
    pub platforms: Vec<PlatformMetrics>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub best_times: BestTimes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnswer {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Caption preview from `POST /api/post/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPreview {
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub optimized_image_path: String,
    #[serde(default)]
    pub auto_post: bool,
}

/// Response from `PUT /api/users/me/plan`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanUpdate {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub plan_status: Option<String>,
    #[serde(default)]
    pub trial_ends_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One page of `GET /api/admin/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserPage {
    #[serde(default)]
    pub data: Vec<AdminUser>,
    #[serde(default)]
    pub total: u64,
}
