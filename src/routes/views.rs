// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guarded view models.
//!
//! Every path here runs behind the route guard, so handlers can rely on a
//! session being present. Background data that fails to load is logged and
//! rendered as `null`; the view itself still succeeds.

use crate::error::Result;
use crate::middleware::CurrentSession;
use crate::models::{
    AdminUser, DashboardData, Platform, Plan, Recommendation, RefreshCheck, Settings,
    UnifiedMetrics,
};
use crate::routes::auth::ProfileSummary;
use crate::services::backend::ADMIN_PAGE_SIZE;
use crate::services::plans::{self, Feature, PlanOffer};
use crate::services::social::{FormattedMetrics, SocialSnapshot};
use crate::services::storage::SETTINGS_KEY;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/analytics", get(analytics))
        .route("/performance", get(performance))
        .route("/audience", get(audience))
        .route("/settings", get(settings))
        .route("/choose-plan", get(choose_plan))
        .route("/payment", get(payment))
        .route("/voice-coach", get(voice_coach))
        .route("/hook-detector", get(hook_detector))
        .route("/create-post", get(create_post))
        .route("/connect-accounts", get(connect_accounts))
        .route("/admin/users", get(admin_users))
}

/// Await a background load, logging and absorbing failure.
async fn soft<T>(what: &'static str, load: impl Future<Output = Result<T>>) -> Option<T> {
    match load.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(view_data = what, error = %e, "View data unavailable");
            None
        }
    }
}

pub fn load_settings(state: &AppState, user_id: &str) -> Settings {
    state
        .user_store
        .read_json(user_id, SETTINGS_KEY)
        .unwrap_or_default()
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: ProfileSummary,
    pub dashboard: Option<DashboardData>,
    pub unified: UnifiedMetrics,
    pub formatted: FormattedMetrics,
    pub connected_platforms: Vec<Platform>,
    pub show_connect_modal: bool,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<DashboardView>> {
    let (_, dashboard) = tokio::join!(
        session.social.mount(),
        soft("full_dashboard", state.backend.full_dashboard())
    );
    let snapshot = session.social.snapshot().await;
    let profile = session.profile().await;

    Ok(Json(DashboardView {
        user: ProfileSummary::from(&profile),
        dashboard,
        connected_platforms: snapshot.connections.connected_platforms(),
        show_connect_modal: !session.social.onboarding_done(),
        unified: snapshot.unified,
        formatted: snapshot.formatted,
    }))
}

// ─── Analytics ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RefreshStatus {
    pub allowed: bool,
    pub message: Option<String>,
    pub refresh_frequency: String,
    pub last_refresh: i64,
}

impl RefreshStatus {
    pub fn from_settings(settings: &Settings) -> Self {
        let check = settings.check_refresh(Utc::now());
        Self {
            allowed: check == RefreshCheck::Allowed,
            message: check.message(),
            refresh_frequency: settings.refresh_frequency.clone(),
            last_refresh: settings.last_refresh,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsView {
    pub dashboard: Option<DashboardData>,
    pub content_comparison: Option<serde_json::Value>,
    pub social: SocialSnapshot,
    pub refresh: RefreshStatus,
}

async fn analytics(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<AnalyticsView>> {
    let (_, dashboard, content_comparison) = tokio::join!(
        session.social.mount(),
        soft("full_dashboard", state.backend.full_dashboard()),
        soft("content_comparison", state.backend.content_comparison()),
    );
    let settings = load_settings(&state, session.user_id());

    Ok(Json(AnalyticsView {
        dashboard,
        content_comparison,
        social: session.social.snapshot().await,
        refresh: RefreshStatus::from_settings(&settings),
    }))
}

// ─── Performance ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PerformanceView {
    pub platforms: Vec<crate::models::PlatformMetrics>,
    pub recommendations: Vec<Recommendation>,
    pub best_times: crate::models::BestTimes,
    pub unified: UnifiedMetrics,
}

async fn performance(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<PerformanceView>> {
    let (_, dashboard) = tokio::join!(
        session.social.mount(),
        soft("full_dashboard", state.backend.full_dashboard())
    );
    let dashboard = dashboard.unwrap_or_default();
    let mut recommendations = dashboard.recommendations;
    recommendations.sort_by_key(|r| r.priority);

    Ok(Json(PerformanceView {
        platforms: dashboard.platforms,
        recommendations,
        best_times: dashboard.best_times,
        unified: session.social.unified().await,
    }))
}

// ─── Audience ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlatformAudience {
    pub platform: Platform,
    pub name: String,
    pub followers: u64,
    pub followers_display: String,
}

#[derive(Debug, Serialize)]
pub struct AudienceView {
    pub platforms: Vec<PlatformAudience>,
    pub total_followers: u64,
    pub total_followers_display: String,
}

async fn audience(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<AudienceView>> {
    session.social.mount().await;
    let snapshot = session.social.snapshot().await;

    let mut platforms = Vec::new();
    if let Some(youtube) = &snapshot.youtube {
        let followers = youtube.totals().followers;
        platforms.push(PlatformAudience {
            platform: Platform::Youtube,
            name: youtube.channel.title.clone(),
            followers,
            followers_display: crate::models::format_number(followers),
        });
    }
    if let Some(instagram) = &snapshot.instagram {
        let followers = instagram.totals().followers;
        platforms.push(PlatformAudience {
            platform: Platform::Instagram,
            name: instagram
                .profile
                .as_ref()
                .map(|p| format!("@{}", p.username))
                .unwrap_or_default(),
            followers,
            followers_display: crate::models::format_number(followers),
        });
    }

    Ok(Json(AudienceView {
        platforms,
        total_followers: snapshot.unified.followers,
        total_followers_display: snapshot.formatted.followers,
    }))
}

// ─── Settings ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub settings: Settings,
    pub refresh: RefreshStatus,
}

async fn settings(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<SettingsView>> {
    let settings = load_settings(&state, session.user_id());
    Ok(Json(SettingsView {
        refresh: RefreshStatus::from_settings(&settings),
        settings,
    }))
}

// ─── Plans ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChoosePlanView {
    pub current_plan: Option<Plan>,
    pub plans: Vec<PlanOffer>,
}

async fn choose_plan(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<ChoosePlanView>> {
    Ok(Json(ChoosePlanView {
        current_plan: session.profile().await.plan,
        plans: plans::plan_catalog(),
    }))
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub plan: Option<Plan>,
    pub plan_name: Option<&'static str>,
    pub price: Option<u32>,
    pub plan_status: Option<String>,
    pub trial_ends_at: Option<String>,
}

async fn payment(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<PaymentView>> {
    let profile = session.profile().await;
    Ok(Json(PaymentView {
        plan: profile.plan,
        plan_name: profile.plan.map(plans::plan_display_name),
        price: profile.plan.map(plans::plan_price),
        plan_status: profile.plan_status,
        trial_ends_at: profile.trial_ends_at,
    }))
}

// ─── Feature landings ────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FeatureView {
    pub feature: Feature,
    pub name: &'static str,
    pub plan: Plan,
}

async fn feature_view(session: &CurrentSession, feature: Feature) -> Json<FeatureView> {
    let plan = session.0.profile().await.plan;
    Json(FeatureView {
        feature,
        name: feature.display_name(),
        plan: crate::services::guard::effective_plan(plan),
    })
}

async fn voice_coach(Extension(session): Extension<CurrentSession>) -> Json<FeatureView> {
    feature_view(&session, Feature::VoiceCoach).await
}

async fn hook_detector(Extension(session): Extension<CurrentSession>) -> Json<FeatureView> {
    feature_view(&session, Feature::Vlm).await
}

async fn create_post(Extension(session): Extension<CurrentSession>) -> Json<FeatureView> {
    feature_view(&session, Feature::CreatePost).await
}

// ─── Connect accounts ────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ConnectionEntry {
    pub platform: Platform,
    pub connected: bool,
    pub public_handle: Option<String>,
    pub has_feed: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectAccountsView {
    pub platforms: Vec<ConnectionEntry>,
    pub connected: usize,
    pub total: usize,
    pub progress: String,
}

async fn connect_accounts(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<ConnectAccountsView>> {
    let connections = session.social.load_connections();
    let platforms: Vec<ConnectionEntry> = Platform::ALL
        .into_iter()
        .map(|platform| {
            let status = connections.get(platform);
            ConnectionEntry {
                platform,
                connected: status.is_some_and(|s| s.connected),
                public_handle: status.and_then(|s| s.public_handle.clone()),
                has_feed: platform.has_feed(),
            }
        })
        .collect();
    let connected = platforms.iter().filter(|p| p.connected).count();
    let total = platforms.len();

    Ok(Json(ConnectAccountsView {
        progress: format!("{connected} of {total} connected"),
        platforms,
        connected,
        total,
    }))
}

// ─── Admin ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdminUsersQuery {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub search: Option<String>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct AdminUsersView {
    pub users: Vec<AdminUser>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// `ceil(total / per_page)`.
pub fn total_pages(total: u64, per_page: u32) -> u64 {
    total.div_ceil(u64::from(per_page.max(1)))
}

pub async fn load_admin_users(
    state: &AppState,
    access_token: &str,
    query: &AdminUsersQuery,
) -> Result<AdminUsersView> {
    let page = query.page.max(1);
    let result = state
        .backend
        .admin_users(access_token, page, query.search.as_deref())
        .await?;

    Ok(AdminUsersView {
        total_pages: total_pages(result.total, ADMIN_PAGE_SIZE),
        users: result.data,
        page,
        per_page: ADMIN_PAGE_SIZE,
        total: result.total,
    })
}

async fn admin_users(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Query(query): Query<AdminUsersQuery>,
) -> Result<Json<AdminUsersView>> {
    Ok(Json(
        load_admin_users(&state, session.access_token(), &query).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn test_refresh_status_before_any_refresh() {
        let status = RefreshStatus::from_settings(&Settings::default());
        assert!(status.allowed);
        assert_eq!(status.message, None);
        assert!(format!("{status:?}").contains("allowed: true"));
    }
}
