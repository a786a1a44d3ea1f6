use criterion::{criterion_group, criterion_main, Criterion};
use socialleaf_gateway::services::report::layout::{layout_report, ChartSize, ReportContent};
use socialleaf_gateway::services::report::markdown;
use std::hint::black_box;

fn long_analysis() -> String {
    let mut text = String::from("## Executive Summary\n");
    for i in 0..40 {
        text.push_str(&format!(
            "- **Week {i}** engagement rose on Reels while static posts held steady across every audience segment we track\n"
        ));
    }
    text
}

fn benchmark_layout(c: &mut Criterion) {
    let metrics: Vec<(String, String)> = (0..8)
        .map(|i| (format!("Metric {i}"), format!("{}.{}K", i * 3, i)))
        .collect();
    let analysis = long_analysis();
    let blocks = markdown::parse(&analysis);
    let charts = vec![
        ChartSize {
            width_px: 1600,
            height_px: 800,
        };
        6
    ];

    let mut group = c.benchmark_group("report_layout");

    group.bench_function("parse_analysis", |b| {
        b.iter(|| markdown::parse(black_box(&analysis)))
    });

    group.bench_function("layout_full_report", |b| {
        b.iter(|| {
            layout_report(black_box(&ReportContent {
                title: "Analytics Report",
                generated: "Generated on 2026-10-14",
                metrics: &metrics,
                summary: Some(blocks.as_slice()),
                charts: &charts,
            }))
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_layout);
criterion_main!(benches);
