// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Screen/page coordinate transforms.
//
// Three spaces are in play:
//   screen  — canvas pixels at the current zoom, origin top-left
//   page    — PDF points at reference zoom (1.0x), origin top-left, y down
//   pdf     — PDF user space, points, origin bottom-left, y up
//
// Annotations are stored in page space. Screen and page differ only by a
// uniform scale; the y flip into pdf space happens exactly once, at export.

/// The current view of a page: user zoom plus the fixed raster sharpness
/// multiplier. Both must be applied identically to the rendered page and to
/// overlay positioning, otherwise annotations drift as zoom changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub render_scale: f32,
}

impl Viewport {
    pub fn new(zoom: f32, render_scale: f32) -> Self {
        Self { zoom, render_scale }
    }

    /// Combined screen-pixels-per-page-point factor.
    pub fn scale(&self) -> f32 {
        self.zoom * self.render_scale
    }

    /// Canvas pixel position -> reference-zoom page point position.
    pub fn screen_to_page(&self, sx: f32, sy: f32) -> (f32, f32) {
        let s = self.scale();
        (sx / s, sy / s)
    }

    /// Reference-zoom page point position -> canvas pixel position.
    pub fn page_to_screen(&self, px: f32, py: f32) -> (f32, f32) {
        let s = self.scale();
        (px * s, py * s)
    }
}

/// Flip a top-left-origin page y (the stored convention) into PDF user space,
/// anchoring the element's bottom edge. `element_height` is zero for points
/// and stroke vertices, the box height for text/image placements. This is the
/// only place the flip happens; the commit engine routes every coordinate
/// through it.
pub fn to_pdf_user_space(page_height: f32, y: f32, element_height: f32) -> f32 {
    page_height - y - element_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use seitenwerk_core::PageDescriptor;

    fn letter() -> PageDescriptor {
        PageDescriptor {
            index: 0,
            width_pt: 612.0,
            height_pt: 792.0,
        }
    }

    #[test]
    fn screen_page_round_trip_is_stable_across_zooms() {
        for zoom in [0.5_f32, 1.0, 1.5, 2.0, 3.0] {
            let vp = Viewport::new(zoom, 1.5);
            let (px, py) = vp.screen_to_page(450.0, 300.0);
            let (sx, sy) = vp.page_to_screen(px, py);
            assert!((sx - 450.0).abs() < 1e-3, "x drift at zoom {zoom}");
            assert!((sy - 300.0).abs() < 1e-3, "y drift at zoom {zoom}");
        }
    }

    #[test]
    fn page_coordinates_are_zoom_independent() {
        // The same physical spot on the page, clicked at two different zooms,
        // must map to the same page coordinates.
        let vp1 = Viewport::new(1.0, 1.5);
        let vp2 = Viewport::new(2.0, 1.5);
        let (px1, py1) = vp1.screen_to_page(150.0, 90.0);
        let (px2, py2) = vp2.screen_to_page(300.0, 180.0);
        assert!((px1 - px2).abs() < 1e-4);
        assert!((py1 - py2).abs() < 1e-4);
    }

    #[test]
    fn pdf_flip_anchors_bottom_edge() {
        let page = letter();
        // A 20pt-tall box whose top edge sits 100pt from the page top ends at
        // pdf y = 792 - 100 - 20 = 672.
        assert!((to_pdf_user_space(page.height_pt, 100.0, 20.0) - 672.0).abs() < 1e-4);
        // A bare point flips without any height offset.
        assert!((to_pdf_user_space(page.height_pt, 0.0, 0.0) - 792.0).abs() < 1e-4);
    }
}
