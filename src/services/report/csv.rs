// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV export of the dashboard overview.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::DashboardData;
use crate::time_utils::date_stamp;

pub fn csv_filename(now: DateTime<Utc>) -> String {
    format!("social_leaf_report_{}.csv", date_stamp(now))
}

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::Report(format!("CSV write failed: {}", e))
}

/// Overview metrics, per-platform breakdown and recommendations as
/// sections of one flexible-width CSV.
pub fn export_csv(data: &DashboardData, now: DateTime<Utc>) -> Result<Vec<u8>, AppError> {
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    let overview = &data.overview;

    writer.write_record(["Social Leaf Analytics Report"]).map_err(csv_error)?;
    writer
        .write_record([format!("Generated: {}", now.format("%Y-%m-%d %H:%M UTC"))])
        .map_err(csv_error)?;
    writer.write_record([""]).map_err(csv_error)?;

    writer.write_record(["OVERVIEW METRICS"]).map_err(csv_error)?;
    writer.write_record(["Metric", "Value"]).map_err(csv_error)?;
    for (metric, value) in [
        ("Total Impressions", overview.total_impressions.to_string()),
        ("Engagement Rate", format!("{}%", overview.engagement_rate)),
        ("Total Comments", overview.total_comments.to_string()),
        ("Total Shares", overview.total_shares.to_string()),
        ("Growth Rate", format!("{}%", overview.growth_rate)),
    ] {
        writer.write_record([metric, value.as_str()]).map_err(csv_error)?;
    }
    writer.write_record([""]).map_err(csv_error)?;

    writer.write_record(["PLATFORM BREAKDOWN"]).map_err(csv_error)?;
    writer
        .write_record(["Platform", "Impressions", "Likes", "Comments", "Shares", "Engagement Rate"])
        .map_err(csv_error)?;
    for p in &data.platforms {
        writer
            .write_record([
                p.platform.clone(),
                p.impressions.to_string(),
                p.likes.to_string(),
                p.comments.to_string(),
                p.shares.to_string(),
                format!("{}%", p.engagement_rate),
            ])
            .map_err(csv_error)?;
    }
    writer.write_record([""]).map_err(csv_error)?;

    writer.write_record(["RECOMMENDATIONS"]).map_err(csv_error)?;
    let mut recommendations: Vec<_> = data.recommendations.iter().collect();
    recommendations.sort_by_key(|r| r.priority);
    for (i, rec) in recommendations.iter().enumerate() {
        let text = match &rec.title {
            Some(title) => format!("{}. {}: {}", i + 1, title, rec.content),
            None => format!("{}. {}", i + 1, rec.content),
        };
        writer.write_record([text]).map_err(csv_error)?;
    }

    writer.into_inner().map_err(csv_error)
}
