// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! printpdf renderer for a computed [`Layout`].

use image::DynamicImage;
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument, PdfLayerReference};

use super::layout::{DrawOp, Layout, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::error::AppError;

const LAYER_NAME: &str = "Layer 1";

fn pdf_error(context: &str, e: impl std::fmt::Debug) -> AppError {
    AppError::Report(format!("{}: {:?}", context, e))
}

/// Render `layout` into PDF bytes. `charts` is indexed by
/// [`DrawOp::Image::chart`].
pub fn render(title: &str, layout: &Layout, charts: &[DynamicImage]) -> Result<Vec<u8>, AppError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| pdf_error("Failed to load font", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| pdf_error("Failed to load font", e))?;

    let mut layers: Vec<PdfLayerReference> =
        vec![doc.get_page(first_page).get_layer(first_layer)];
    for _ in 1..layout.pages {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        layers.push(doc.get_page(page).get_layer(layer));
    }

    for op in &layout.ops {
        match op {
            DrawOp::Text {
                page,
                x,
                y,
                size,
                bold: is_bold,
                text,
            } => {
                let layer = layers
                    .get(*page)
                    .ok_or_else(|| AppError::Report(format!("Page {} out of range", page)))?;
                let font = if *is_bold { &bold } else { &regular };
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(PAGE_HEIGHT_MM - *y), font);
            }
            DrawOp::Image {
                page,
                chart,
                x,
                y,
                width,
                height,
            } => {
                let layer = layers
                    .get(*page)
                    .ok_or_else(|| AppError::Report(format!("Page {} out of range", page)))?;
                let source = charts
                    .get(*chart)
                    .ok_or_else(|| AppError::Report(format!("Chart {} missing", chart)))?;

                // Same DPI on both axes keeps the aspect ratio.
                let dpi = source.width() as f32 * 25.4 / *width;
                let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(source.to_rgb8()));
                image.add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(*x)),
                        translate_y: Some(Mm(PAGE_HEIGHT_MM - *y - *height)),
                        dpi: Some(dpi),
                        ..Default::default()
                    },
                );
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| pdf_error("Failed to write PDF", e))
}
