// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SocialLeaf REST API client.
//!
//! Handles:
//! - Profile lookup and plan changes
//! - System status polling
//! - Social feeds (featured YouTube, Instagram)
//! - AI, post generation and admin calls
//!
//! `/demo/...` and the feed endpoints are unauthenticated; everything else
//! under `/api/...` carries the session's bearer token.

use crate::error::AppError;
use crate::models::{
    AdminUserPage, AiAnswer, DashboardData, InstagramData, Insight, Plan, PlanUpdate, Platform,
    PostPreview, Profile, Recommendation, Role, SystemStatus,
};
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

/// Page size the admin user list is requested with.
pub const ADMIN_PAGE_SIZE: u32 = 20;

/// Image plus caption options for `POST /api/post/generate`.
#[derive(Debug, Clone, Default)]
pub struct PostUpload {
    pub image: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub niche: Option<String>,
    pub tone: Option<String>,
    pub goal: Option<String>,
    pub cta: Option<String>,
    pub auto_post: bool,
}

/// SocialLeaf API client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Every request, including connect and body transfer, is bounded by
    /// `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building SocialLeaf API client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ─── Demo (unauthenticated) ──────────────────────────────

    pub async fn full_dashboard(&self) -> Result<DashboardData, AppError> {
        self.get_public(&self.url("/demo/full-dashboard")).await
    }

    pub async fn content_comparison(&self) -> Result<serde_json::Value, AppError> {
        self.get_public(&self.url("/demo/content-comparison")).await
    }

    // ─── Profile ─────────────────────────────────────────────

    /// Profile of the token's owner.
    pub async fn current_user(&self, access_token: &str) -> Result<Profile, AppError> {
        self.get_json(&self.url("/api/users/me"), access_token).await
    }

    pub async fn update_plan(&self, access_token: &str, plan: Plan) -> Result<PlanUpdate, AppError> {
        let response = self
            .http
            .put(self.url("/api/users/me/plan"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "plan": plan }))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    pub async fn system_status(&self) -> Result<SystemStatus, AppError> {
        self.get_public(&self.url("/api/system/status")).await
    }

    // ─── Social feeds ────────────────────────────────────────

    /// Featured YouTube channels: either an array of channel payloads or a
    /// single payload.
    pub async fn youtube_featured(&self) -> Result<serde_json::Value, AppError> {
        self.get_public(&self.url("/api/youtube/featured")).await
    }

    pub async fn instagram(&self, handle: Option<&str>) -> Result<InstagramData, AppError> {
        let mut request = self.http.get(self.url("/api/real/instagram"));
        if let Some(handle) = handle {
            request = request.query(&[("handle", handle)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    pub async fn connect_platform(
        &self,
        access_token: &str,
        platform: Platform,
        platform_token: &str,
    ) -> Result<serde_json::Value, AppError> {
        let body = serde_json::json!({
            "platform_name": platform.as_str(),
            "access_token": platform_token,
        });
        self.post_json(&self.url("/api/platforms/connect"), access_token, &body)
            .await
    }

    // ─── AI ──────────────────────────────────────────────────

    pub async fn ai_query(&self, access_token: &str, question: &str) -> Result<AiAnswer, AppError> {
        let body = serde_json::json!({ "question": question });
        self.post_json(&self.url("/api/ai/query"), access_token, &body)
            .await
    }

    pub async fn ai_insights(&self, access_token: &str) -> Result<Vec<Insight>, AppError> {
        self.get_json(&self.url("/api/ai/insights"), access_token)
            .await
    }

    pub async fn generate_insights(
        &self,
        access_token: &str,
    ) -> Result<serde_json::Value, AppError> {
        self.post_json(
            &self.url("/api/ai/generate-insights"),
            access_token,
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn recommendations(
        &self,
        access_token: &str,
    ) -> Result<Vec<Recommendation>, AppError> {
        self.get_json(&self.url("/api/ai/recommendations"), access_token)
            .await
    }

    /// Upload an image and get a caption preview back.
    pub async fn generate_post(
        &self,
        access_token: &str,
        upload: PostUpload,
    ) -> Result<PostPreview, AppError> {
        use reqwest::multipart::{Form, Part};

        let image = Part::bytes(upload.image)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid image type: {}", e)))?;

        let mut form = Form::new().part("image", image);
        for (name, value) in [
            ("niche", upload.niche),
            ("tone", upload.tone),
            ("goal", upload.goal),
            ("cta", upload.cta),
        ] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                form = form.text(name, value);
            }
        }
        form = form.text("auto_post", upload.auto_post.to_string());

        let response = self
            .http
            .post(self.url("/api/post/generate"))
            .bearer_auth(access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    // ─── Admin ───────────────────────────────────────────────

    pub async fn admin_users(
        &self,
        access_token: &str,
        page: u32,
        search: Option<&str>,
    ) -> Result<AdminUserPage, AppError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", ADMIN_PAGE_SIZE.to_string()),
        ];
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }

        let response = self
            .http
            .get(self.url("/api/admin/users"))
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    pub async fn admin_set_role(
        &self,
        access_token: &str,
        user_id: &str,
        role: Role,
    ) -> Result<(), AppError> {
        let url = self.url(&format!(
            "/api/admin/users/{}/role",
            urlencoding::encode(user_id)
        ));
        self.post_unit(&url, access_token, &serde_json::json!({ "role": role }))
            .await
    }

    pub async fn admin_set_plan(
        &self,
        access_token: &str,
        user_id: &str,
        plan: Plan,
    ) -> Result<(), AppError> {
        let url = self.url(&format!(
            "/api/admin/users/{}/plan",
            urlencoding::encode(user_id)
        ));
        self.post_unit(&url, access_token, &serde_json::json!({ "plan": plan }))
            .await
    }

    // ─── Plumbing ────────────────────────────────────────────

    async fn get_public<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    async fn post_unit(
        &self,
        url: &str,
        access_token: &str,
        body: &serde_json::Value,
    ) -> Result<(), AppError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response(response).await
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, body))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Failed to parse response: {}", e)))
    }
}

/// FastAPI-style error body: `{"detail": "..."}` or `{"detail": {...}}`.
#[derive(Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

fn detail_message(body: &str) -> String {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(ErrorDetail {
            detail: serde_json::Value::String(msg),
        }) => msg,
        Ok(ErrorDetail { detail }) => detail
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| detail.to_string()),
        Err(_) => body.to_string(),
    }
}

fn error_for_status(status: reqwest::StatusCode, body: String) -> AppError {
    match status.as_u16() {
        // Token expired or revoked upstream
        401 => AppError::Backend(AppError::BACKEND_TOKEN_ERROR.to_string()),
        403 => AppError::Forbidden(detail_message(&body)),
        404 => AppError::NotFound(detail_message(&body)),
        _ => AppError::Backend(format!("HTTP {}: {}", status, body)),
    }
}
