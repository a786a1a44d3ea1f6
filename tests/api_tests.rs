// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session-authenticated API routes.

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

mod common;

use common::body_json;

#[tokio::test]
async fn test_api_requires_session() {
    let app = common::create_test_app().await;

    let response = app.get("/api/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");

    let response = app.get("/api/me", Some("forged.session.token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let body = body_json(app.get("/api/me", Some(&session)).await).await;
    assert_eq!(body["id"], "user-pro");
    assert_eq!(body["name"], "Test user-pro");
    assert_eq!(body["plan"], "professional");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_navigation_marks_locked_entries() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::STARTER_TOKEN).await;

    let body = body_json(
        app.get("/api/navigation?current=/analytics", Some(&session))
            .await,
    )
    .await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 8);
    let voice = entries.iter().find(|e| e["href"] == "/voice-coach").unwrap();
    assert_eq!(voice["locked"], true);
    assert_eq!(voice["required_plan"], "professional");
    let analytics = entries.iter().find(|e| e["href"] == "/analytics").unwrap();
    assert_eq!(analytics["active"], true);
    assert_eq!(analytics["locked"], false);
    assert_eq!(body["plan_name"], "Starter Plan");

    let admin = app.sign_in(common::ADMIN_TOKEN).await;
    let body = body_json(app.get("/api/navigation", Some(&admin)).await).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 9);
    assert!(entries.iter().all(|e| e["locked"] == false));
}

#[tokio::test]
async fn test_feature_access() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let body = body_json(app.get("/api/features/voiceCoach", Some(&session)).await).await;
    assert_eq!(body["allowed"], true);
    assert!(body["upgrade"].is_null());

    let body = body_json(app.get("/api/features/vlm", Some(&session)).await).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["upgrade"]["required_plans"], json!(["business"]));

    let response = app.get("/api/features/teleport", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ai_query() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let response = app
        .send_json(
            "POST",
            "/api/ai/query",
            &session,
            json!({ "question": "  When should I post?  " }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["answer"],
        "You asked: When should I post?"
    );

    let response = app
        .send_json("POST", "/api/ai/query", &session, json!({ "question": "   " }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_sorted_by_priority() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let body = body_json(app.get("/api/ai/recommendations", Some(&session)).await).await;
    assert_eq!(body[0]["content"], "First");
    assert_eq!(body[1]["content"], "Later");
}

#[tokio::test]
async fn test_generate_post_gated_by_plan() {
    let app = common::create_test_app().await;
    let pro = app.sign_in(common::PRO_TOKEN).await;
    let business = app.sign_in(common::BUSINESS_TOKEN).await;
    let image = format!("data:image/png;base64,{}", STANDARD.encode(b"fake image bytes"));

    let response = app
        .send_json(
            "POST",
            "/api/posts/generate",
            &pro,
            json!({ "image": image, "tone": "warm" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "plan_restriction");

    let response = app
        .send_json(
            "POST",
            "/api/posts/generate",
            &business,
            json!({ "image": image, "tone": "warm" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["caption"], "Fresh out of the oven");
    assert_eq!(body["hashtags"], json!(["#baking"]));

    let response = app
        .send_json(
            "POST",
            "/api/posts/generate",
            &business,
            json!({ "image": "not base64!" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_post_accepts_large_images() {
    let app = common::create_test_app().await;
    let business = app.sign_in(common::BUSINESS_TOKEN).await;

    // Well past the default JSON body limit, under the image cap.
    let image = STANDARD.encode(vec![7u8; 3 * 1024 * 1024]);
    let response = app
        .send_json(
            "POST",
            "/api/posts/generate",
            &business,
            json!({ "image": image, "content_type": "image/jpeg" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.api.upload_bytes.load(std::sync::atomic::Ordering::SeqCst) > 3 * 1024 * 1024);

    let image = STANDARD.encode(vec![7u8; 10 * 1024 * 1024 + 1]);
    let response = app
        .send_json("POST", "/api/posts/generate", &business, json!({ "image": image }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_actions_held_during_maintenance() {
    let app = common::create_test_app().await;
    let pro = app.sign_in(common::PRO_TOKEN).await;
    let admin = app.sign_in(common::ADMIN_TOKEN).await;

    app.api.set_status(json!({
        "maintenance_mode": true,
        "announcement": "Upgrading databases",
        "announcement_active": true,
    }));
    app.state.monitor.check_now().await;

    let response = app
        .send_json("POST", "/api/ai/query", &pro, json!({ "question": "When should I post?" }))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["state"], "maintenance");
    assert_eq!(body["announcement"], "Upgrading databases");

    let response = app
        .send_json("POST", "/api/plan", &pro, json!({ "plan": "business" }))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Admins keep working through maintenance.
    let response = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.api.set_status(json!({ "maintenance_mode": false }));
    app.state.monitor.check_now().await;
    let response = app
        .send_json("POST", "/api/ai/query", &pro, json!({ "question": "When should I post?" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_banned_account_cannot_act() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::BANNED_TOKEN).await;

    let response = app
        .send_json(
            "PUT",
            "/api/connections/instagram",
            &session,
            json!({ "public_handle": "bakery" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "account_banned");

    let response = app.get("/api/me", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.state.user_store.get("user-banned", "socialleaf_connections").is_none());
}

#[tokio::test]
async fn test_backend_not_found_passes_through() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    // The fake API does not serve these
    let response = app.get("/api/ai/insights", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send_json("POST", "/api/ai/generate-insights", &session, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let app = common::create_test_app().await;
    app.sign_in(common::PRO_TOKEN).await;

    let body = body_json(app.get("/health", None).await).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["live_sessions"], 1);
}
