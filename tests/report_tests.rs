// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PDF and CSV exports through the API.

use axum::http::{header, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::json;
use std::io::Cursor;

mod common;

use common::{body_bytes, body_json};

fn png_data_url(width: u32, height: u32) -> String {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

#[tokio::test]
async fn test_pdf_without_charts_or_analysis() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let response = app
        .send_json(
            "POST",
            "/api/reports/pdf",
            &session,
            json!({
                "title": "Analytics Report",
                "metrics": [{ "label": "Impressions", "value": "30.0K" }],
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"analytics_report_"));
    assert!(disposition.ends_with(".pdf\""));

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_pdf_with_analysis_and_charts() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let response = app
        .send_json(
            "POST",
            "/api/reports/pdf",
            &session,
            json!({
                "title": "Performance Report",
                "metrics": [
                    { "label": "Impressions", "value": "30.0K" },
                    { "label": "Engagement", "value": "4.20%" },
                ],
                "analysis": "## Summary\n**Reels** are winning.\n- Post at 6pm\n- Reply to comments",
                "charts": [
                    { "id": "engagement", "data_url": png_data_url(80, 40) },
                    { "id": "reach", "data_url": png_data_url(40, 40) },
                ],
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_bad_chart_fails_whole_export() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let response = app
        .send_json(
            "POST",
            "/api/reports/pdf",
            &session,
            json!({
                "title": "Analytics Report",
                "charts": [
                    { "id": "good", "data_url": png_data_url(10, 10) },
                    { "id": "broken", "data_url": "data:image/png;base64,!!!" },
                ],
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "report_failed");
    assert_eq!(body["details"], "Failed to generate PDF. Please try again.");
}

#[tokio::test]
async fn test_pdf_requires_title() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let response = app
        .send_json("POST", "/api/reports/pdf", &session, json!({ "title": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_csv_export() {
    let app = common::create_test_app().await;
    let session = app.sign_in(common::PRO_TOKEN).await;

    let response = app.get("/api/reports/csv", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("social_leaf_report_"));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("OVERVIEW METRICS"));
    assert!(text.contains("Total Impressions,125000"));
    assert!(text.contains("instagram,80000,4000,500,200,5.9%"));

    // Recommendations come out in priority order, numbered.
    let first = text.find("1. Use more Reels").unwrap();
    let second = text.find("2. Post at 6pm").unwrap();
    assert!(first < second);
    assert!(text.contains("\"1. Use more Reels, \"\"short\"\" ones\""));
}

#[tokio::test]
async fn test_exports_require_session() {
    let app = common::create_test_app().await;

    let response = app.get("/api/reports/csv", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
