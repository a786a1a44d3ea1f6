// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in users.

use crate::error::{AppError, Result};
use crate::middleware::CurrentSession;
use crate::models::settings::parse_frequency;
use crate::models::{
    AiAnswer, ConnectionStatus, Connections, Insight, Plan, Platform, PostPreview,
    Recommendation, Settings,
};
use crate::routes::auth::ProfileSummary;
use crate::routes::views::{load_settings, RefreshStatus};
use crate::services::backend::PostUpload;
use crate::services::plans::{self, Feature, UpgradePrompt};
use crate::services::report::{self, ReportRequest};
use crate::services::social::SocialSnapshot;
use crate::services::storage::SETTINGS_KEY;
use crate::time_utils::epoch_millis;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Upper bound on an uploaded post image.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// A maximal image, base64 encoded (4/3), plus the caption options.
const POST_BODY_LIMIT: usize = MAX_IMAGE_BYTES / 3 * 4 + 1024 * 1024;

/// Up to 20 chart captures from the browser.
const REPORT_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// API routes (require a session).
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/plan", post(select_plan))
        .route("/api/navigation", get(navigation))
        .route("/api/features/{feature}", get(feature_access))
        .route("/api/social", get(get_social))
        .route("/api/social/refresh", post(refresh_social))
        .route("/api/social/refresh/{platform}", post(refresh_platform))
        .route(
            "/api/connections/{platform}",
            put(connect_platform).delete(disconnect_platform),
        )
        .route("/api/onboarding/complete", post(complete_onboarding))
        .route("/api/analytics/refresh", post(refresh_analytics))
        .route("/api/settings", put(update_settings))
        .route("/api/ai/query", post(ai_query))
        .route("/api/ai/insights", get(ai_insights))
        .route("/api/ai/generate-insights", post(generate_insights))
        .route("/api/ai/recommendations", get(ai_recommendations))
        .route(
            "/api/posts/generate",
            post(generate_post).layer(DefaultBodyLimit::max(POST_BODY_LIMIT)),
        )
        .route(
            "/api/reports/pdf",
            post(export_pdf).layer(DefaultBodyLimit::max(REPORT_BODY_LIMIT)),
        )
        .route("/api/reports/csv", get(export_csv))
}

// ─── User Profile ────────────────────────────────────────────

async fn get_me(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Json<ProfileSummary> {
    Json(ProfileSummary::from(&session.profile().await))
}

// ─── Plan Selection ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectPlanRequest {
    pub plan: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SelectPlanResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub plan: Plan,
    pub next: String,
    pub trial_ends_at: Option<String>,
}

/// Persist the chosen plan, then reload the profile so the guard sees it.
async fn select_plan(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(body): Json<SelectPlanRequest>,
) -> Result<Json<SelectPlanResponse>> {
    let plan = Plan::parse(&body.plan)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown plan: {}", body.plan)))?;

    let update = state
        .backend
        .update_plan(session.access_token(), plan)
        .await?;
    let profile = session.refresh_profile(&state.backend).await?;

    tracing::info!(
        user_id = %session.user_id(),
        plan = %plan,
        success = update.success,
        "Plan selected"
    );

    Ok(Json(SelectPlanResponse {
        plan: profile.plan.unwrap_or(plan),
        next: plans::next_path_after_selection(plan).to_string(),
        trial_ends_at: profile.trial_ends_at.or(update.trial_ends_at),
    }))
}

// ─── Navigation ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct NavEntry {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
    pub locked: bool,
    pub required_plan: Option<Plan>,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub entries: Vec<NavEntry>,
    pub user_name: String,
    pub initials: String,
    pub plan_name: String,
}

const NAV_LINKS: [(&str, &str, Option<Feature>); 8] = [
    ("Overview", "/dashboard", None),
    ("Analytics", "/analytics", None),
    ("Performance", "/performance", None),
    ("Audience", "/audience", None),
    ("Voice Coach", "/voice-coach", Some(Feature::VoiceCoach)),
    ("Hook Detector", "/hook-detector", Some(Feature::Vlm)),
    ("Create Post", "/create-post", Some(Feature::CreatePost)),
    ("Settings", "/settings", None),
];

#[derive(Debug, Deserialize)]
pub struct NavigationQuery {
    #[serde(default)]
    pub current: Option<String>,
}

async fn navigation(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    axum::extract::Query(query): axum::extract::Query<NavigationQuery>,
) -> Json<NavigationResponse> {
    let profile = session.profile().await;
    let current = query.current.unwrap_or_default();

    let mut entries: Vec<NavEntry> = NAV_LINKS
        .iter()
        .map(|&(label, href, feature)| {
            let locked = feature
                .is_some_and(|f| !plans::can_access_feature(profile.plan, profile.role, f));
            NavEntry {
                label,
                href,
                active: current == href,
                locked,
                required_plan: feature
                    .filter(|_| locked)
                    .and_then(|f| plans::required_plans(f).first().copied()),
            }
        })
        .collect();
    if profile.role.is_admin() {
        entries.push(NavEntry {
            label: "Admin",
            href: "/admin/users",
            active: current == "/admin/users",
            locked: false,
            required_plan: None,
        });
    }

    Json(NavigationResponse {
        entries,
        user_name: profile.display_name(),
        initials: profile.initials(),
        plan_name: format!(
            "{} Plan",
            plans::plan_display_name(crate::services::guard::effective_plan(profile.plan))
        ),
    })
}

#[derive(Debug, Serialize)]
pub struct FeatureAccess {
    pub feature: Feature,
    pub allowed: bool,
    pub upgrade: Option<UpgradePrompt>,
}

async fn feature_access(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(feature): Path<String>,
) -> Result<Json<FeatureAccess>> {
    let feature = Feature::parse(&feature)
        .ok_or_else(|| AppError::NotFound(format!("Unknown feature: {}", feature)))?;
    let facts = session.facts().await;
    let allowed = plans::can_access_feature(facts.plan, facts.role, feature);

    Ok(Json(FeatureAccess {
        feature,
        allowed,
        upgrade: (!allowed).then(|| UpgradePrompt::new(facts.plan, feature)),
    }))
}

// ─── Social Data ─────────────────────────────────────────────

async fn get_social(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Json<SocialSnapshot> {
    session.social.mount().await;
    Json(session.social.snapshot().await)
}

async fn refresh_social(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Json<SocialSnapshot> {
    session.social.refresh_all().await;
    Json(session.social.snapshot().await)
}

fn parse_platform(raw: &str) -> Result<Platform> {
    Platform::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown platform: {}", raw)))
}

async fn refresh_platform(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(platform): Path<String>,
) -> Result<Json<SocialSnapshot>> {
    let platform = parse_platform(&platform)?;
    session.social.refresh_platform(platform).await?;
    Ok(Json(session.social.snapshot().await))
}

// ─── Connections ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ConnectRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub public_handle: Option<String>,
    /// Platform OAuth token; registered with the API when present
    #[serde(default)]
    pub access_token: Option<String>,
}

async fn connect_platform(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(platform): Path<String>,
    body: Option<Json<ConnectRequest>>,
) -> Result<Json<Connections>> {
    let platform = parse_platform(&platform)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if let Some(token) = body.access_token.as_deref().filter(|t| !t.is_empty()) {
        state
            .backend
            .connect_platform(session.access_token(), platform, token)
            .await?;
    }

    let handle = body
        .public_handle
        .map(|h| h.trim().trim_start_matches('@').to_string());
    let status = ConnectionStatus {
        connected: true,
        data_type: Some(if handle.is_some() { "public" } else { "oauth" }.to_string()),
        public_handle: handle,
    };
    let connections = session
        .social
        .update_connection(platform, Some(status))
        .await?;
    Ok(Json(connections))
}

async fn disconnect_platform(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(platform): Path<String>,
) -> Result<Json<Connections>> {
    let platform = parse_platform(&platform)?;
    let connections = session.social.update_connection(platform, None).await?;
    Ok(Json(connections))
}

/// Dismiss the connect-accounts prompt without connecting anything.
async fn complete_onboarding(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> StatusCode {
    session.social.mark_onboarding_done();
    StatusCode::NO_CONTENT
}

// ─── Analytics Refresh & Settings ────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyticsRefreshResponse {
    pub social: SocialSnapshot,
    pub refresh: RefreshStatus,
}

/// Manual refresh, limited by the user's refresh frequency.
async fn refresh_analytics(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<AnalyticsRefreshResponse>> {
    let mut settings = load_settings(&state, session.user_id());
    let now = Utc::now();
    if let Some(message) = settings.check_refresh(now).message() {
        return Err(AppError::Cooldown(message));
    }

    settings.last_refresh = epoch_millis(now);
    state
        .user_store
        .write_json(session.user_id(), SETTINGS_KEY, &settings, session.id())?;
    session.social.refresh_all().await;

    Ok(Json(AnalyticsRefreshResponse {
        social: session.social.snapshot().await,
        refresh: RefreshStatus::from_settings(&settings),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub refresh_frequency: String,
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(body): Json<SettingsUpdate>,
) -> Result<Json<Settings>> {
    let hours = parse_frequency(&body.refresh_frequency)
        .filter(|h| (1..=48).contains(h))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "refresh_frequency must be between 1h and 48h, got {}",
                body.refresh_frequency
            ))
        })?;

    let mut settings = load_settings(&state, session.user_id());
    settings.refresh_frequency = format!("{hours}h");
    state
        .user_store
        .write_json(session.user_id(), SETTINGS_KEY, &settings, session.id())?;
    Ok(Json(settings))
}

// ─── AI ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct AiQueryRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
}

async fn ai_query(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(body): Json<AiQueryRequest>,
) -> Result<Json<AiAnswer>> {
    let question = body.question.trim().to_string();
    AiQueryRequest {
        question: question.clone(),
    }
    .validate()
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let answer = state
        .backend
        .ai_query(session.access_token(), &question)
        .await?;
    Ok(Json(answer))
}

async fn ai_insights(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<Vec<Insight>>> {
    Ok(Json(state.backend.ai_insights(session.access_token()).await?))
}

async fn generate_insights(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<serde_json::Value>> {
    Ok(Json(
        state
            .backend
            .generate_insights(session.access_token())
            .await?,
    ))
}

async fn ai_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<Vec<Recommendation>>> {
    let mut recommendations = state
        .backend
        .recommendations(session.access_token())
        .await?;
    recommendations.sort_by_key(|r| r.priority);
    Ok(Json(recommendations))
}

// ─── Post Generation ─────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct GeneratePostRequest {
    /// Base64 image bytes, optionally as a data URL
    pub image: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub niche: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub tone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub goal: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub cta: Option<String>,
    #[serde(default)]
    pub auto_post: bool,
}

/// Split `data:<type>;base64,<payload>` into its parts.
fn split_data_url(raw: &str) -> (Option<&str>, &str) {
    match raw
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
    {
        Some((content_type, payload)) => (Some(content_type), payload),
        None => (None, raw),
    }
}

async fn generate_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(body): Json<GeneratePostRequest>,
) -> Result<axum::response::Response> {
    let facts = session.facts().await;
    if !plans::can_access_feature(facts.plan, facts.role, Feature::CreatePost) {
        let prompt = UpgradePrompt::new(facts.plan, Feature::CreatePost);
        return Ok((StatusCode::FORBIDDEN, Json(prompt)).into_response());
    }
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (url_type, payload) = split_data_url(&body.image);
    let image = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid image encoding: {}", e)))?;
    if image.is_empty() || image.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest(
            "Image must be between 1 byte and 10 MB".to_string(),
        ));
    }

    let content_type = body
        .content_type
        .as_deref()
        .or(url_type)
        .unwrap_or("image/png")
        .to_string();
    let upload = PostUpload {
        image,
        file_name: body.file_name.unwrap_or_else(|| "upload.png".to_string()),
        content_type,
        niche: body.niche,
        tone: body.tone,
        goal: body.goal,
        cta: body.cta,
        auto_post: body.auto_post,
    };

    let preview: PostPreview = state
        .backend
        .generate_post(session.access_token(), upload)
        .await?;
    Ok(Json(preview).into_response())
}

// ─── Reports ─────────────────────────────────────────────────

fn attachment(filename: &str, content_type: &'static str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
}

async fn export_pdf(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(request): Json<ReportRequest>,
) -> Result<impl IntoResponse> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // Image decoding and PDF assembly are CPU bound.
    let rendered = tokio::task::spawn_blocking(move || report::export_pdf(&request, Utc::now()))
        .await
        .map_err(|e| AppError::Report(format!("Report task failed: {}", e)))??;

    tracing::info!(
        user_id = %session.user_id(),
        filename = %rendered.filename,
        "Report exported"
    );
    Ok(attachment(&rendered.filename, "application/pdf", rendered.bytes))
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<impl IntoResponse> {
    let dashboard = state.backend.full_dashboard().await?;
    let now = Utc::now();
    let bytes = report::export_csv(&dashboard, now)?;

    tracing::info!(user_id = %session.user_id(), "CSV exported");
    Ok(attachment(&report::csv_filename(now), "text/csv", bytes))
}
