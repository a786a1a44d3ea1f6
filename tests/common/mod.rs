// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test harness: an in-process stand-in for the SocialLeaf API and
//! a gateway wired to it.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use socialleaf_gateway::config::Config;
use socialleaf_gateway::middleware::auth::decode_session_token;
use socialleaf_gateway::routes::create_router;
use socialleaf_gateway::services::Session;
use socialleaf_gateway::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const STARTER_TOKEN: &str = "starter-token";
pub const PRO_TOKEN: &str = "pro-token";
pub const BUSINESS_TOKEN: &str = "business-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const BANNED_TOKEN: &str = "banned-token";
pub const NO_PLAN_TOKEN: &str = "no-plan-token";

/// Mutable state behind the fake API.
pub struct FakeApi {
    /// access token -> `/api/users/me` body
    pub users: Mutex<HashMap<String, Value>>,
    pub status: Mutex<Value>,
    pub youtube_calls: AtomicUsize,
    pub instagram_calls: AtomicUsize,
    pub admin_calls: Mutex<Vec<String>>,
    /// Delay before `/api/users/me` answers
    pub me_delay_ms: AtomicU64,
    /// Body size of the last post upload
    pub upload_bytes: AtomicUsize,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeApi {
    pub fn new() -> Self {
        let mut users = HashMap::new();
        for (token, id, plan, role) in [
            (STARTER_TOKEN, "user-starter", Some("starter"), "user"),
            (PRO_TOKEN, "user-pro", Some("professional"), "user"),
            (BUSINESS_TOKEN, "user-business", Some("business"), "user"),
            (ADMIN_TOKEN, "user-admin", Some("starter"), "admin"),
            (BANNED_TOKEN, "user-banned", Some("business"), "banned"),
            (NO_PLAN_TOKEN, "user-new", None, "user"),
        ] {
            users.insert(
                token.to_string(),
                json!({
                    "id": id,
                    "email": format!("{id}@example.com"),
                    "name": format!("Test {id}"),
                    "plan": plan,
                    "plan_status": "active",
                    "role": role,
                }),
            );
        }

        Self {
            users: Mutex::new(users),
            status: Mutex::new(json!({ "maintenance_mode": false })),
            youtube_calls: AtomicUsize::new(0),
            instagram_calls: AtomicUsize::new(0),
            admin_calls: Mutex::new(Vec::new()),
            me_delay_ms: AtomicU64::new(0),
            upload_bytes: AtomicUsize::new(0),
        }
    }

    pub fn set_status(&self, status: Value) {
        *self.status.lock().unwrap() = status;
    }

    pub fn youtube_calls(&self) -> usize {
        self.youtube_calls.load(Ordering::SeqCst)
    }

    pub fn instagram_calls(&self) -> usize {
        self.instagram_calls.load(Ordering::SeqCst)
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Invalid token" })),
    )
        .into_response()
}

async fn me(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Response {
    let delay = api.me_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let users = api.users.lock().unwrap();
    match bearer(&headers).and_then(|t| users.get(&t).cloned()) {
        Some(user) => Json(user).into_response(),
        None => unauthorized(),
    }
}

async fn update_plan(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut users = api.users.lock().unwrap();
    let Some(user) = bearer(&headers).and_then(|t| users.get_mut(&t)) else {
        return unauthorized();
    };
    user["plan"] = body["plan"].clone();
    user["plan_status"] = json!("trialing");
    user["trial_ends_at"] = json!("2026-11-14T00:00:00Z");
    Json(json!({
        "success": true,
        "plan": body["plan"],
        "plan_status": "trialing",
        "trial_ends_at": "2026-11-14T00:00:00Z",
    }))
    .into_response()
}

async fn system_status(State(api): State<Arc<FakeApi>>) -> Json<Value> {
    Json(api.status.lock().unwrap().clone())
}

fn channel(title: &str, custom_url: &str, subscribers: u64, views: &[u64]) -> Value {
    let videos: Vec<Value> = views
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "id": format!("{custom_url}-{i}"),
                "title": format!("Video {i}"),
                "statistics": { "views": v, "likes": v / 10, "comments": v / 100 },
            })
        })
        .collect();
    json!({
        "channel": {
            "title": title,
            "thumbnail": "https://img.example.com/c.png",
            "customUrl": custom_url,
            "statistics": { "subscribers": subscribers, "views": 0, "videos": views.len() },
        },
        "recent_videos": videos,
    })
}

async fn youtube_featured(State(api): State<Arc<FakeApi>>) -> Json<Value> {
    api.youtube_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        channel("Cooking Daily", "@cookingdaily", 5_000, &[1_000]),
        channel("MrBeast", "@mrbeast", 300_000_000, &[10_000, 20_000]),
    ]))
}

async fn instagram(
    State(api): State<Arc<FakeApi>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    api.instagram_calls.fetch_add(1, Ordering::SeqCst);
    let username = query
        .get("handle")
        .cloned()
        .unwrap_or_else(|| "socialleaf".to_string());
    Json(json!({
        "profile": { "username": username, "followers": 1_200, "following": 10, "posts": 30 },
        "metrics": { "impressions": 5_000, "posts": 30 },
    }))
}

async fn full_dashboard() -> Json<Value> {
    Json(json!({
        "overview": {
            "total_impressions": 125_000,
            "engagement_rate": 4.2,
            "total_comments": 900,
            "total_shares": 310,
            "growth_rate": 12.5,
        },
        "platforms": [
            { "platform": "instagram", "impressions": 80_000, "likes": 4_000, "comments": 500, "shares": 200, "engagement_rate": 5.9 },
            { "platform": "youtube", "impressions": 45_000, "likes": 1_800, "comments": 400, "shares": 110, "engagement_rate": 5.1 },
        ],
        "insights": [ { "type": "trend", "summary": "Reels outperform photos" } ],
        "recommendations": [
            { "type": "timing", "content": "Post at 6pm", "priority": 2 },
            { "type": "format", "content": "Use more Reels, \"short\" ones", "priority": 1 },
        ],
        "best_times": { "instagram": { "monday": ["18:00-20:00"] } },
    }))
}

fn authed(api: &FakeApi, headers: &HeaderMap) -> Option<Value> {
    let users = api.users.lock().unwrap();
    bearer(headers).and_then(|t| users.get(&t).cloned())
}

async fn ai_query(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if authed(&api, &headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "answer": format!("You asked: {}", body["question"].as_str().unwrap_or_default()) }))
        .into_response()
}

async fn recommendations(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Response {
    if authed(&api, &headers).is_none() {
        return unauthorized();
    }
    Json(json!([
        { "type": "timing", "content": "Later", "priority": 3 },
        { "type": "format", "content": "First", "priority": 1 },
    ]))
    .into_response()
}

async fn generate_post(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if authed(&api, &headers).is_none() {
        return unauthorized();
    }
    api.upload_bytes.store(body.len(), Ordering::SeqCst);
    Json(json!({
        "caption": "Fresh out of the oven",
        "hashtags": ["#baking"],
        "cta": "Follow for more",
        "style": "warm",
        "optimized_image_path": "/tmp/optimized.png",
        "auto_post": false,
    }))
    .into_response()
}

async fn connect_platform(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Response {
    if authed(&api, &headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "success": true })).into_response()
}

fn require_admin(api: &FakeApi, headers: &HeaderMap) -> Result<(), Response> {
    match authed(api, headers) {
        Some(user) if user["role"] == "admin" => Ok(()),
        Some(_) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "detail": "Admin privileges required" })),
        )
            .into_response()),
        None => Err(unauthorized()),
    }
}

async fn admin_users(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = require_admin(&api, &headers) {
        return response;
    }
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = query
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20);
    let search = query.get("search").cloned().unwrap_or_default();

    let all: Vec<Value> = (0..45)
        .map(|i| {
            json!({
                "id": format!("u{i}"),
                "email": format!("member{i}@example.com"),
                "role": "user",
                "plan": "starter",
            })
        })
        .filter(|u| u["email"].as_str().unwrap_or_default().contains(&search))
        .collect();
    let data: Vec<Value> = all
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Json(json!({ "data": data, "total": all.len() })).into_response()
}

async fn admin_update(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path((id, field)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = require_admin(&api, &headers) {
        return response;
    }
    api.admin_calls
        .lock()
        .unwrap()
        .push(format!("{id}:{field}={}", body[&field].as_str().unwrap_or_default()));
    Json(json!({ "success": true })).into_response()
}

fn fake_router(api: Arc<FakeApi>) -> Router {
    Router::new()
        .route("/api/users/me", get(me))
        .route("/api/users/me/plan", put(update_plan))
        .route("/api/system/status", get(system_status))
        .route("/api/youtube/featured", get(youtube_featured))
        .route("/api/real/instagram", get(instagram))
        .route("/demo/full-dashboard", get(full_dashboard))
        .route("/api/ai/query", post(ai_query))
        .route("/api/ai/recommendations", get(recommendations))
        .route(
            "/api/post/generate",
            post(generate_post).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/platforms/connect", post(connect_platform))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/users/{id}/{field}", post(admin_update))
        .with_state(api)
}

/// Serve the fake API on an ephemeral port; returns its base URL.
pub async fn spawn_fake_api(api: Arc<FakeApi>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fake_router(api)).await.unwrap();
    });
    format!("http://{addr}")
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub api: Arc<FakeApi>,
}

/// Gateway wired to a fresh fake API, with the first status check done.
pub async fn create_test_app() -> TestApp {
    let app = create_test_app_unchecked().await;
    app.state.monitor.check_now().await;
    app
}

/// Like [`create_test_app`], with config overrides applied first.
pub async fn create_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let app = build_test_app(configure).await;
    app.state.monitor.check_now().await;
    app
}

/// Gateway whose maintenance monitor has not run yet.
pub async fn create_test_app_unchecked() -> TestApp {
    build_test_app(|_| {}).await
}

async fn build_test_app(configure: impl FnOnce(&mut Config)) -> TestApp {
    let api = Arc::new(FakeApi::new());
    let mut config = Config::test_default();
    config.api_base_url = spawn_fake_api(api.clone()).await;
    configure(&mut config);

    let state = Arc::new(AppState::new(config).unwrap());
    TestApp {
        router: create_router(state.clone()),
        state,
        api,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sign in with an API access token; returns the gateway session token.
    pub async fn sign_in(&self, access_token: &str) -> String {
        let response = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/auth/sign-in")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "access_token": access_token }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["session_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Server-side session behind a gateway session token.
    pub fn session(&self, session_token: &str) -> Arc<Session> {
        let id = decode_session_token(session_token, &self.state.config.session_signing_key)
            .unwrap();
        self.state.sessions.get(&id).unwrap()
    }

    pub async fn get(&self, uri: &str, session: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = session {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        session: &str,
        body: Value,
    ) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {session}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}
