// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview compositor.
//
// Builds the on-screen picture for one page in three layers, all at the same
// viewport scale so nothing drifts under zoom:
//   base     — the rendered page raster
//   strokes  — pen and highlight marks, repainted from scratch every call,
//              finished strokes plus the one currently being drawn
//   overlay  — positioned screen-space boxes for text, image, and signature
//              placements; the host renders and hit-tests these itself
//              (text stays editable until commit bakes it in)

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use seitenwerk_core::{Annotation, AnnotationId, Color, DrawKind, Result};
use tracing::{debug, instrument};

use crate::interaction::{InteractionEngine, stroke_style};
use crate::session::EditorSession;

/// What an overlay box holds, so the host can pick a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Text,
    Image,
    Signature,
}

/// A positioned annotation box in screen pixels at the current viewport.
#[derive(Debug, Clone, Copy)]
pub struct OverlayElement {
    pub id: AnnotationId,
    pub kind: OverlayKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A composed page: base raster, stroke layer, and overlay element list.
/// Base and strokes have identical dimensions.
#[derive(Debug)]
pub struct ComposedPage {
    pub base: RgbaImage,
    pub strokes: RgbaImage,
    pub overlay: Vec<OverlayElement>,
}

impl ComposedPage {
    /// Alpha-blend the stroke layer onto the base. Overlay elements are the
    /// host's to draw; they are not baked into the preview image.
    pub fn flatten(&self) -> RgbaImage {
        let mut out = self.base.clone();
        for (x, y, pixel) in self.strokes.enumerate_pixels() {
            let alpha = pixel[3] as f32 / 255.0;
            if alpha <= 0.0 {
                continue;
            }
            let base = out.get_pixel_mut(x, y);
            for channel in 0..3 {
                let over = pixel[channel] as f32;
                let under = base[channel] as f32;
                base[channel] = (over * alpha + under * (1.0 - alpha)).round() as u8;
            }
            base[3] = 255;
        }
        out
    }
}

/// Render one page with its pending annotations at the session's current
/// viewport scale, including the stroke the engine is mid-drawing.
#[instrument(skip(session, engine))]
pub fn compose_page(
    session: &EditorSession,
    engine: &InteractionEngine,
    page_index: usize,
) -> Result<ComposedPage> {
    let scale = session.viewport().scale();
    let base = session.model().render_preview(page_index, scale)?;
    let mut strokes = RgbaImage::from_pixel(base.width(), base.height(), Rgba([0, 0, 0, 0]));
    let mut overlay = Vec::new();

    let highlight_opacity = session.config().highlight_opacity;
    for annotation in session.store().list_for_page(page_index) {
        match annotation {
            Annotation::Draw(stroke) => draw_stroke(
                &mut strokes,
                &stroke.points,
                stroke.kind,
                stroke.color,
                stroke.stroke_width,
                scale,
                highlight_opacity,
            ),
            Annotation::Text(text) => {
                let width = text.text.chars().count() as f32 * text.font_size * 0.5;
                overlay.push(OverlayElement {
                    id: text.id,
                    kind: OverlayKind::Text,
                    x: text.x * scale,
                    y: text.y * scale,
                    width: width.max(text.font_size) * scale,
                    height: text.font_size * scale,
                });
            }
            Annotation::Image(image) => overlay.push(OverlayElement {
                id: image.id,
                kind: OverlayKind::Image,
                x: image.x * scale,
                y: image.y * scale,
                width: image.width * scale,
                height: image.height * scale,
            }),
            Annotation::Signature(sig) => overlay.push(OverlayElement {
                id: sig.id,
                kind: OverlayKind::Signature,
                x: sig.x * scale,
                y: sig.y * scale,
                width: sig.width * scale,
                height: sig.height * scale,
            }),
        }
    }

    // The stroke still under the pointer previews with the same style it will
    // get when it lands in the store.
    if let Some((stroke_page, points, kind)) = engine.active_stroke() {
        if stroke_page == page_index {
            let (color, width) = stroke_style(kind, session.config());
            draw_stroke(&mut strokes, points, kind, color, width, scale, highlight_opacity);
        }
    }

    debug!(
        page_index,
        width = base.width(),
        height = base.height(),
        overlay = overlay.len(),
        "Composed page"
    );
    Ok(ComposedPage { base, strokes, overlay })
}

/// Draw a stroke as line segments between consecutive points, thickened with
/// filled caps at each vertex.
fn draw_stroke(
    layer: &mut RgbaImage,
    points: &[(f32, f32)],
    kind: DrawKind,
    color: Color,
    stroke_width: f32,
    scale: f32,
    highlight_opacity: f32,
) {
    let alpha = match kind {
        DrawKind::Pen => 255u8,
        DrawKind::Highlight => (highlight_opacity * 255.0).round() as u8,
    };
    let pixel = Rgba([color.r, color.g, color.b, alpha]);
    let radius = ((stroke_width * scale) / 2.0).max(1.0) as i32;

    let scaled: Vec<(f32, f32)> = points.iter().map(|(x, y)| (x * scale, y * scale)).collect();

    for window in scaled.windows(2) {
        draw_line_segment_mut(layer, window[0], window[1], pixel);
    }
    for (x, y) in &scaled {
        draw_filled_circle_mut(layer, (*x as i32, *y as i32), radius, pixel);
    }
}
