// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pointer interaction.
//
// Every pointer event is dispatched on the session's active tool, matched
// exhaustively on the `Tool` enum. The engine holds only transient gesture
// state (an in-flight drag or stroke); everything durable lives in the
// session's annotation store.

use seitenwerk_core::{
    Annotation, AnnotationId, Color, DrawAnnotation, DrawKind, ImageAnnotation, ImageEncoding,
    Result, SeitenwerkError, SessionConfig, TextAnnotation, Tool,
};
use tracing::{debug, instrument};

use crate::session::EditorSession;

/// One pointer sample, in raw client pixels plus the canvas origin so the
/// engine can derive canvas-relative coordinates itself.
#[derive(Debug, Clone, Copy)]
pub struct PointerInput {
    pub page_index: usize,
    /// Pointer position in client pixels.
    pub client: (f32, f32),
    /// Top-left of the page canvas in client pixels.
    pub canvas_origin: (f32, f32),
}

impl PointerInput {
    /// Pointer position relative to the page canvas, in screen pixels.
    fn canvas(&self) -> (f32, f32) {
        (
            self.client.0 - self.canvas_origin.0,
            self.client.1 - self.canvas_origin.1,
        )
    }
}

/// Pointer lifecycle events the host feeds in.
#[derive(Debug, Clone, Copy)]
pub enum PointerEvent {
    Down(PointerInput),
    Move(PointerInput),
    Up(PointerInput),
    DoubleClick(PointerInput),
}

/// An annotation being moved, with the pointer's previous page position.
#[derive(Debug, Clone, Copy)]
struct DragState {
    id: AnnotationId,
    last: (f32, f32),
}

/// A freehand stroke being drawn, not yet committed to the store.
#[derive(Debug, Clone)]
struct StrokeInProgress {
    page_index: usize,
    points: Vec<(f32, f32)>,
    kind: DrawKind,
}

/// Color and width used for new strokes of the given kind.
pub(crate) fn stroke_style(kind: DrawKind, config: &SessionConfig) -> (Color, f32) {
    match kind {
        DrawKind::Pen => (config.default_text_color, 2.0),
        DrawKind::Highlight => (Color::new(255, 235, 59), 14.0),
    }
}

/// Transient gesture state plus the current selection.
#[derive(Debug, Default)]
pub struct InteractionEngine {
    drag: Option<DragState>,
    stroke: Option<StrokeInProgress>,
    selected: Option<AnnotationId>,
}

impl InteractionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    /// The stroke currently being drawn, if any, for live preview.
    pub fn active_stroke(&self) -> Option<(usize, &[(f32, f32)], DrawKind)> {
        self.stroke
            .as_ref()
            .map(|s| (s.page_index, s.points.as_slice(), s.kind))
    }

    /// Dispatch one pointer event against the session's active tool.
    #[instrument(skip(self, session), fields(tool = ?session.active_tool()))]
    pub fn handle(&mut self, session: &mut EditorSession, event: PointerEvent) -> Result<()> {
        // Double-click always means "open this text annotation for editing",
        // no matter which tool is active.
        if matches!(event, PointerEvent::DoubleClick(_)) {
            self.handle_select(session, event);
            return Ok(());
        }
        match session.active_tool() {
            Tool::Select => self.handle_select(session, event),
            Tool::Text => self.handle_text(session, event),
            Tool::Draw => self.handle_stroke(session, event, DrawKind::Pen),
            Tool::Highlight => self.handle_stroke(session, event, DrawKind::Highlight),
            // The image tool places via `place_image`, not pointer gestures;
            // pointer events while it is active fall through to selection so
            // a freshly placed image can be dragged immediately.
            Tool::Image => self.handle_select(session, event),
            Tool::Erase => self.handle_erase(session, event),
        }
        Ok(())
    }

    // -- Select ---------------------------------------------------------------

    fn handle_select(&mut self, session: &mut EditorSession, event: PointerEvent) {
        match event {
            PointerEvent::Down(input) => {
                let point = page_point(session, input);
                match hit_test(session, input.page_index, point) {
                    Some(id) => {
                        self.selected = Some(id);
                        self.drag = Some(DragState { id, last: point });
                    }
                    None => {
                        self.selected = None;
                        session.end_text_edit();
                    }
                }
            }
            PointerEvent::Move(input) => {
                if let Some(drag) = &mut self.drag {
                    let point = page_point(session, input);
                    let delta = (point.0 - drag.last.0, point.1 - drag.last.1);
                    drag.last = point;
                    let id = drag.id;
                    if let Some(annotation) = session.store_mut().get_mut(id) {
                        translate(annotation, delta);
                    }
                }
            }
            PointerEvent::Up(_) => {
                self.drag = None;
            }
            PointerEvent::DoubleClick(input) => {
                // Double-click opens an existing text annotation for editing.
                // It never creates anything.
                let point = page_point(session, input);
                if let Some(id) = hit_test(session, input.page_index, point) {
                    if matches!(session.store().get(id), Some(Annotation::Text(_))) {
                        let _ = session.begin_text_edit(id);
                        self.selected = Some(id);
                    }
                }
            }
        }
    }

    // -- Text (one-shot) ------------------------------------------------------

    fn handle_text(&mut self, session: &mut EditorSession, event: PointerEvent) {
        let PointerEvent::Down(input) = event else {
            return;
        };
        let point = page_point(session, input);
        let config = session.config().clone();
        let annotation = TextAnnotation {
            id: AnnotationId::new(),
            page_index: input.page_index,
            x: point.0,
            y: point.1,
            text: config.placeholder_text.clone(),
            font_size: config.default_font_size,
            color: config.default_text_color,
            weight: config.default_font_weight,
            family: config.default_font_family,
        };
        let id = session.store_mut().add_text(annotation);
        let _ = session.begin_text_edit(id);
        self.selected = Some(id);
        // One-shot: placing a text box drops straight back into Select so the
        // next click moves it instead of spawning another box.
        session.set_tool(Tool::Select);
        debug!(%id, "Placed text annotation");
    }

    // -- Draw / Highlight -----------------------------------------------------

    fn handle_stroke(&mut self, session: &mut EditorSession, event: PointerEvent, kind: DrawKind) {
        match event {
            PointerEvent::Down(input) => {
                let point = page_point(session, input);
                self.stroke = Some(StrokeInProgress {
                    page_index: input.page_index,
                    points: vec![point],
                    kind,
                });
            }
            PointerEvent::Move(input) => {
                if let Some(stroke) = &mut self.stroke {
                    if stroke.page_index == input.page_index {
                        stroke.points.push(page_point(session, input));
                    }
                }
            }
            PointerEvent::Up(_) => {
                let Some(stroke) = self.stroke.take() else {
                    return;
                };
                if stroke.points.len() < session.config().min_stroke_points {
                    debug!(points = stroke.points.len(), "Discarded degenerate stroke");
                    return;
                }
                let (color, stroke_width) = stroke_style(stroke.kind, session.config());
                session.store_mut().add_draw(DrawAnnotation {
                    id: AnnotationId::new(),
                    page_index: stroke.page_index,
                    points: stroke.points,
                    color,
                    stroke_width,
                    kind: stroke.kind,
                });
            }
            // Routed to the select handler before tool dispatch.
            PointerEvent::DoubleClick(_) => {}
        }
    }

    // -- Erase ----------------------------------------------------------------

    fn handle_erase(&mut self, session: &mut EditorSession, event: PointerEvent) {
        let input = match event {
            PointerEvent::Down(input) | PointerEvent::Move(input) => input,
            _ => return,
        };
        let point = page_point(session, input);
        let radius = session.config().erase_radius;

        // Erasing removes whole strokes; partial stroke splitting is not a
        // thing. Only draw annotations are erasable, other kinds are removed
        // through selection.
        let doomed: Vec<AnnotationId> = session
            .store()
            .list_for_page(input.page_index)
            .into_iter()
            .filter_map(|annotation| match annotation {
                Annotation::Draw(stroke)
                    if stroke
                        .points
                        .iter()
                        .any(|p| distance(*p, point) <= radius) =>
                {
                    Some(stroke.id)
                }
                _ => None,
            })
            .collect();

        for id in doomed {
            session.store_mut().remove(id);
            if self.selected == Some(id) {
                self.selected = None;
            }
            debug!(%id, "Erased stroke");
        }
    }

    // -- Image placement ------------------------------------------------------

    /// Place an uploaded image at the configured anchor on `page_index`,
    /// scaled to a sensible on-page size. Returns the new annotation's id.
    #[instrument(skip(self, session, data), fields(bytes = data.len()))]
    pub fn place_image(
        &mut self,
        session: &mut EditorSession,
        page_index: usize,
        data: Vec<u8>,
    ) -> Result<AnnotationId> {
        if ImageEncoding::detect(&data).is_none() {
            return Err(SeitenwerkError::Image(
                "unsupported image format (PNG or JPEG required)".into(),
            ));
        }
        let (px_w, px_h) = image::load_from_memory(&data)
            .map(|img| (img.width(), img.height()))
            .map_err(|err| SeitenwerkError::Image(format!("cannot decode image: {err}")))?;

        let page = session.page(page_index)?;
        let anchor = session.config().image_anchor;

        // Fit the longest edge to 200pt without upscaling tiny images past
        // their natural size at 72dpi.
        let natural_w = px_w as f32;
        let natural_h = px_h as f32;
        let scale = (200.0 / natural_w.max(natural_h)).min(1.0);
        let width = (natural_w * scale).min(page.width_pt - anchor.0);
        let height = (natural_h * scale).min(page.height_pt - anchor.1);

        let annotation = ImageAnnotation {
            id: AnnotationId::new(),
            page_index,
            x: anchor.0,
            y: anchor.1,
            width,
            height,
            data,
        };
        let id = session.store_mut().add_image(annotation);
        self.selected = Some(id);
        Ok(id)
    }
}

// -- Geometry -----------------------------------------------------------------

/// Screen pixel input -> reference-zoom page point.
fn page_point(session: &EditorSession, input: PointerInput) -> (f32, f32) {
    let (cx, cy) = input.canvas();
    session.viewport().screen_to_page(cx, cy)
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Axis-aligned bounds of an annotation in page coordinates.
fn bounds(annotation: &Annotation) -> (f32, f32, f32, f32) {
    match annotation {
        Annotation::Text(text) => {
            let width = text.text.chars().count() as f32 * text.font_size * 0.5;
            (text.x, text.y, width.max(text.font_size), text.font_size)
        }
        Annotation::Draw(stroke) => {
            let mut min_x = f32::MAX;
            let mut min_y = f32::MAX;
            let mut max_x = f32::MIN;
            let mut max_y = f32::MIN;
            for (x, y) in &stroke.points {
                min_x = min_x.min(*x);
                min_y = min_y.min(*y);
                max_x = max_x.max(*x);
                max_y = max_y.max(*y);
            }
            let pad = stroke.stroke_width;
            (
                min_x - pad,
                min_y - pad,
                (max_x - min_x) + 2.0 * pad,
                (max_y - min_y) + 2.0 * pad,
            )
        }
        Annotation::Image(image) => (image.x, image.y, image.width, image.height),
        Annotation::Signature(sig) => (sig.x, sig.y, sig.width, sig.height),
    }
}

/// Topmost annotation under `point` on a page. Later insertions draw on top,
/// so the scan walks z-order back to front.
fn hit_test(session: &EditorSession, page_index: usize, point: (f32, f32)) -> Option<AnnotationId> {
    session
        .store()
        .list_for_page(page_index)
        .into_iter()
        .rev()
        .find(|annotation| {
            let (x, y, w, h) = bounds(annotation);
            point.0 >= x && point.0 <= x + w && point.1 >= y && point.1 <= y + h
        })
        .map(|annotation| annotation.id())
}

/// Move an annotation by a page-space delta.
fn translate(annotation: &mut Annotation, delta: (f32, f32)) {
    match annotation {
        Annotation::Text(text) => {
            text.x += delta.0;
            text.y += delta.1;
        }
        Annotation::Draw(stroke) => {
            for point in &mut stroke.points {
                point.0 += delta.0;
                point.1 += delta.1;
            }
        }
        Annotation::Image(image) => {
            image.x += delta.0;
            image.y += delta.1;
        }
        Annotation::Signature(sig) => {
            sig.x += delta.0;
            sig.y += delta.1;
        }
    }
}
