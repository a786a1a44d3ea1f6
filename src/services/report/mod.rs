// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report exporter.
//!
//! Builds an A4 landscape PDF from a title, a metrics summary, optional AI
//! analysis text and chart images captured by the browser. Any failure
//! aborts the whole export with [`AppError::Report`].

pub mod csv;
pub mod layout;
pub mod markdown;
pub mod pdf;

use base64::Engine;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::time_utils::date_stamp;
use layout::{ChartSize, ReportContent};

pub use self::csv::{csv_filename, export_csv};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartCapture {
    pub id: String,
    /// `data:image/png;base64,...`
    pub data_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub metrics: Vec<MetricRow>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub charts: Vec<ChartCapture>,
}

#[derive(Debug)]
pub struct RenderedReport {
    pub filename: String,
    pub pages: usize,
    pub bytes: Vec<u8>,
}

/// `"Analytics Report"` on 2026-05-01 -> `analytics_report_2026-05-01.pdf`.
pub fn report_filename(title: &str, now: DateTime<Utc>) -> String {
    let stem = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}.pdf", stem, date_stamp(now))
}

/// Decode a PNG data URL into an image.
pub fn decode_chart(capture: &ChartCapture) -> Result<DynamicImage, AppError> {
    let encoded = capture
        .data_url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| AppError::Report(format!("Chart {} is not a PNG data URL", capture.id)))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Report(format!("Chart {}: bad base64: {}", capture.id, e)))?;
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| AppError::Report(format!("Chart {}: undecodable image: {}", capture.id, e)))
}

pub fn export_pdf(request: &ReportRequest, now: DateTime<Utc>) -> Result<RenderedReport, AppError> {
    let charts = request
        .charts
        .iter()
        .map(decode_chart)
        .collect::<Result<Vec<_>, _>>()?;
    let sizes: Vec<ChartSize> = charts
        .iter()
        .map(|img| ChartSize {
            width_px: img.width(),
            height_px: img.height(),
        })
        .collect();

    let metrics: Vec<(String, String)> = request
        .metrics
        .iter()
        .map(|row| (row.label.clone(), row.value.clone()))
        .collect();
    let summary = request
        .analysis
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .map(markdown::parse);
    let generated = now.format("%Y-%m-%d %H:%M UTC").to_string();

    let layout = layout::layout_report(&ReportContent {
        title: &request.title,
        generated: &generated,
        metrics: &metrics,
        summary: summary.as_deref(),
        charts: &sizes,
    });
    let bytes = pdf::render(&request.title, &layout, &charts)?;

    tracing::info!(
        title = %request.title,
        pages = layout.pages,
        charts = charts.len(),
        bytes = bytes.len(),
        "PDF report generated"
    );
    Ok(RenderedReport {
        filename: report_filename(&request.title, now),
        pages: layout.pages,
        bytes,
    })
}
