// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page layout for exported reports.
//!
//! Produces positioned draw operations on A4 landscape pages. Coordinates
//! are millimetres from the top-left corner; the renderer converts them.
//! Text width is estimated from the font size, which is close enough for
//! wrapping with the built-in Helvetica faces.

use super::markdown::{Block, Span};

pub const PAGE_WIDTH_MM: f32 = 297.0;
pub const PAGE_HEIGHT_MM: f32 = 210.0;
pub const MARGIN_MM: f32 = 14.0;
pub const PRINTABLE_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

/// First content line on page one, below the header.
const HEADER_BOTTOM_MM: f32 = 30.0;
/// Content never goes below this line; the footer lives underneath.
pub const CONTENT_BOTTOM_MM: f32 = PAGE_HEIGHT_MM - MARGIN_MM;
pub const PRINTABLE_HEIGHT_MM: f32 = CONTENT_BOTTOM_MM - MARGIN_MM;
const FOOTER_Y_MM: f32 = PAGE_HEIGHT_MM - 6.0;

const TITLE_PT: f32 = 18.0;
const GENERATED_PT: f32 = 10.0;
const SECTION_PT: f32 = 14.0;
const BODY_PT: f32 = 11.0;
const FOOTER_PT: f32 = 9.0;
const VALUE_COLUMN_MM: f32 = 120.0;
const BULLET_INDENT_MM: f32 = 6.0;
const CHART_GAP_MM: f32 = 6.0;

const MM_PER_PT: f32 = 25.4 / 72.0;
/// Average Helvetica glyph width relative to the font size.
const AVG_GLYPH_EM: f32 = 0.5;

fn line_height(size_pt: f32) -> f32 {
    size_pt * MM_PER_PT * 1.5
}

pub fn text_width(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * MM_PER_PT * AVG_GLYPH_EM
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        page: usize,
        x: f32,
        /// Baseline
        y: f32,
        size: f32,
        bold: bool,
        text: String,
    },
    Image {
        page: usize,
        /// Index into the chart list
        chart: usize,
        x: f32,
        /// Top edge
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub pages: usize,
    pub ops: Vec<DrawOp>,
}

impl Layout {
    pub fn ops_on(&self, page: usize) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(move |op| match op {
            DrawOp::Text { page: p, .. } | DrawOp::Image { page: p, .. } => *p == page,
        })
    }
}

/// Pixel size of a captured chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width_px: u32,
    pub height_px: u32,
}

/// Chart size on the page: full printable width, aspect preserved, capped
/// at the printable height.
pub fn fit_chart(size: ChartSize) -> (f32, f32) {
    if size.width_px == 0 || size.height_px == 0 {
        return (0.0, 0.0);
    }
    let aspect = size.height_px as f32 / size.width_px as f32;
    let mut width = PRINTABLE_WIDTH_MM;
    let mut height = width * aspect;
    if height > PRINTABLE_HEIGHT_MM {
        height = PRINTABLE_HEIGHT_MM;
        width = height / aspect;
    }
    (width, height)
}

pub struct ReportContent<'a> {
    pub title: &'a str,
    pub generated: &'a str,
    pub metrics: &'a [(String, String)],
    pub summary: Option<&'a [Block]>,
    pub charts: &'a [ChartSize],
}

struct Cursor {
    page: usize,
    y: f32,
    ops: Vec<DrawOp>,
}

impl Cursor {
    /// Break to a new page when `height` does not fit below the cursor.
    fn reserve(&mut self, height: f32) {
        if self.y + height > CONTENT_BOTTOM_MM && self.y > MARGIN_MM {
            self.page += 1;
            self.y = MARGIN_MM;
        }
    }

    fn text(&mut self, x: f32, size: f32, bold: bool, text: impl Into<String>) {
        self.ops.push(DrawOp::Text {
            page: self.page,
            x,
            y: self.y,
            size,
            bold,
            text: text.into(),
        });
    }

    /// One line of text at `size`, advancing the cursor.
    fn line(&mut self, x: f32, size: f32, bold: bool, text: impl Into<String>) {
        let height = line_height(size);
        self.reserve(height);
        self.y += height;
        self.text(x, size, bold, text);
    }

    /// Wrapped runs of mixed weight starting at `x`.
    fn spans(&mut self, x: f32, size: f32, spans: &[Span]) {
        let width = PRINTABLE_WIDTH_MM - (x - MARGIN_MM);
        for line in wrap_spans(spans, width, size) {
            let height = line_height(size);
            self.reserve(height);
            self.y += height;
            let mut run_x = x;
            for span in line {
                let advance = text_width(&span.text, size);
                self.text(run_x, size, span.bold, span.text);
                run_x += advance;
            }
        }
    }
}

/// Greedy word wrap that keeps span weights.
pub fn wrap_spans(spans: &[Span], width_mm: f32, size_pt: f32) -> Vec<Vec<Span>> {
    let max_chars = (width_mm / (size_pt * MM_PER_PT * AVG_GLYPH_EM)).floor().max(1.0) as usize;
    let mut lines: Vec<Vec<Span>> = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    let mut used = 0usize;

    for span in spans {
        for word in span.text.split_whitespace() {
            let len = word.chars().count();
            let sep = usize::from(used > 0);
            if used > 0 && used + sep + len > max_chars {
                lines.push(std::mem::take(&mut current));
                used = 0;
            }
            let piece = if used > 0 {
                format!(" {word}")
            } else {
                word.to_string()
            };
            used += piece.chars().count();
            match current.last_mut() {
                Some(prev) if prev.bold == span.bold => prev.text.push_str(&piece),
                _ => current.push(Span {
                    text: piece,
                    bold: span.bold,
                }),
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn layout_report(content: &ReportContent<'_>) -> Layout {
    let mut cursor = Cursor {
        page: 0,
        y: 0.0,
        ops: Vec::new(),
    };

    // Header
    cursor.y = 15.0;
    cursor.text(MARGIN_MM, TITLE_PT, true, content.title);
    cursor.y = 22.0;
    cursor.text(
        MARGIN_MM,
        GENERATED_PT,
        false,
        format!("Generated: {}", content.generated),
    );
    cursor.y = HEADER_BOTTOM_MM;

    // Metrics table
    cursor.line(MARGIN_MM, SECTION_PT, true, "Key Metrics");
    for (label, value) in content.metrics {
        let height = line_height(BODY_PT);
        cursor.reserve(height);
        cursor.y += height;
        cursor.text(MARGIN_MM, BODY_PT, false, label.as_str());
        cursor.text(MARGIN_MM + VALUE_COLUMN_MM, BODY_PT, true, value.as_str());
    }

    if let Some(blocks) = content.summary.filter(|b| !b.is_empty()) {
        cursor.y += line_height(BODY_PT) / 2.0;
        cursor.line(MARGIN_MM, SECTION_PT, true, "Executive Summary");
        for block in blocks {
            match block {
                Block::Heading { level, text } => {
                    let size = if *level == 2 { 13.0 } else { 12.0 };
                    cursor.line(MARGIN_MM, size, true, text.as_str());
                }
                Block::Bullet { marker, spans } => {
                    let height = line_height(BODY_PT);
                    cursor.reserve(height);
                    let marker_y = cursor.y + height;
                    let marker_page = cursor.page;
                    cursor.spans(MARGIN_MM + BULLET_INDENT_MM, BODY_PT, spans);
                    cursor.ops.push(DrawOp::Text {
                        page: marker_page,
                        x: MARGIN_MM,
                        y: marker_y,
                        size: BODY_PT,
                        bold: false,
                        text: marker.clone(),
                    });
                }
                Block::Paragraph(spans) => cursor.spans(MARGIN_MM, BODY_PT, spans),
                Block::Spacer => cursor.y += line_height(BODY_PT) / 2.0,
            }
        }
    }

    for (index, size) in content.charts.iter().enumerate() {
        let (width, height) = fit_chart(*size);
        if height == 0.0 {
            continue;
        }
        cursor.y += CHART_GAP_MM;
        cursor.reserve(height);
        cursor.ops.push(DrawOp::Image {
            page: cursor.page,
            chart: index,
            x: MARGIN_MM,
            y: cursor.y,
            width,
            height,
        });
        cursor.y += height;
    }

    let pages = cursor.page + 1;
    for page in 0..pages {
        let footer = format!("Page {} of {}", page + 1, pages);
        let x = (PAGE_WIDTH_MM - text_width(&footer, FOOTER_PT)) / 2.0;
        cursor.ops.push(DrawOp::Text {
            page,
            x,
            y: FOOTER_Y_MM,
            size: FOOTER_PT,
            bold: false,
            text: footer,
        });
    }

    Layout {
        pages,
        ops: cursor.ops,
    }
}
