// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing-session configuration.
//
// Nothing here is persisted. Sessions are ephemeral by design — edits live in
// memory only and are discarded when the session ends.

use serde::{Deserialize, Serialize};

use crate::types::{Color, FontFamily, FontWeight};

/// Tunables for an editing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed raster sharpness multiplier applied on top of user zoom. Must be
    /// applied identically to the page raster and all overlay positioning or
    /// annotations drift as zoom changes.
    pub render_scale_factor: f32,
    /// Alpha for highlight strokes (pen strokes are opaque).
    pub highlight_opacity: f32,
    /// Erase hit-test radius in reference-zoom page units.
    pub erase_radius: f32,
    /// Strokes shorter than this many points are discarded on pointer-up.
    pub min_stroke_points: usize,
    /// Default size for newly placed text annotations.
    pub default_font_size: f32,
    pub default_font_family: FontFamily,
    pub default_font_weight: FontWeight,
    pub default_text_color: Color,
    /// Placeholder shown when the text tool places a new annotation.
    pub placeholder_text: String,
    /// Default anchor (from the page's top-left) for uploaded images.
    pub image_anchor: (f32, f32),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            render_scale_factor: 1.5,
            highlight_opacity: 0.3,
            erase_radius: 20.0,
            min_stroke_points: 2,
            default_font_size: 16.0,
            default_font_family: FontFamily::Helvetica,
            default_font_weight: FontWeight::Normal,
            default_text_color: Color::BLACK,
            placeholder_text: "Text".to_string(),
            image_anchor: (36.0, 36.0),
        }
    }
}
