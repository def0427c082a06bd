// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Seitenwerk PDF toolkit.
//
// Annotation coordinates are always stored in PDF points at reference zoom
// (1.0x), origin top-left, y growing downward. The flip into PDF user space
// (origin bottom-left) happens once, at export time. Keeping a single
// convention for every annotation kind avoids the mixed points-vs-fractions
// representation that plagued earlier designs; fractional placement input is
// converted at exactly one boundary (`SignaturePlacement::from_fractional`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a pending annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable description of a single page in a loaded document.
///
/// Source of truth for all coordinate transforms on that page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Zero-based page index.
    pub index: usize,
    /// Page width in PDF points (1/72 inch).
    pub width_pt: f32,
    /// Page height in PDF points.
    pub height_pt: f32,
}

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` or `RRGGBB` hex string. Malformed input yields black.
    pub fn from_hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        // `get` keeps non-ASCII input (where byte offsets may split a char)
        // on the fallback path instead of panicking.
        let channel = |range| {
            hex.get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        };
        match (channel(0..2), channel(2..4), channel(4..6)) {
            (Some(r), Some(g), Some(b)) => Self { r, g, b },
            _ => Self::BLACK,
        }
    }

    /// Components as unit-interval floats for PDF `rg`/`RG` operators.
    pub fn unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

/// Logical font families mapped onto the PDF base-14 set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontFamily {
    Helvetica,
    TimesRoman,
    Courier,
}

impl FontFamily {
    /// Resolve a user-supplied family name. Anything unrecognised falls back
    /// to Helvetica rather than failing.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "times" | "times new roman" | "times-roman" | "serif" => Self::TimesRoman,
            "courier" | "courier new" | "monospace" | "mono" => Self::Courier,
            _ => Self::Helvetica,
        }
    }

    /// PDF base font name for this family at the given weight.
    pub fn base_font(&self, weight: FontWeight) -> &'static str {
        match (self, weight) {
            (Self::Helvetica, FontWeight::Normal) => "Helvetica",
            (Self::Helvetica, FontWeight::Bold) => "Helvetica-Bold",
            (Self::TimesRoman, FontWeight::Normal) => "Times-Roman",
            (Self::TimesRoman, FontWeight::Bold) => "Times-Bold",
            (Self::Courier, FontWeight::Normal) => "Courier",
            (Self::Courier, FontWeight::Bold) => "Courier-Bold",
        }
    }
}

/// Text weight for text annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    Normal,
    Bold,
}

/// A pending text edit on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub id: AnnotationId,
    pub page_index: usize,
    /// Left edge, points at reference zoom, origin top-left.
    pub x: f32,
    /// Top edge, points at reference zoom, origin top-left.
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    pub color: Color,
    pub weight: FontWeight,
    pub family: FontFamily,
}

/// Whether a stroke is an opaque pen line or a translucent highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawKind {
    Pen,
    Highlight,
}

/// A finished freehand stroke. Point list is immutable once the stroke ends;
/// erasing removes the whole annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawAnnotation {
    pub id: AnnotationId,
    pub page_index: usize,
    /// Ordered points, in reference-zoom page coordinates.
    pub points: Vec<(f32, f32)>,
    pub color: Color,
    pub stroke_width: f32,
    pub kind: DrawKind,
}

/// A pending raster image placement. Pixel data is immutable after creation;
/// position and size may change any number of times before commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnnotation {
    pub id: AnnotationId,
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Encoded image bytes (PNG or JPEG, sniffed at embed time).
    pub data: Vec<u8>,
}

/// A signature stamp — an image placement created from a captured signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturePlacement {
    pub id: AnnotationId,
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub data: Vec<u8>,
}

impl SignaturePlacement {
    /// Build a placement from fractional (0-1) page coordinates.
    ///
    /// This is the only sanctioned entry point for fractional input; the
    /// stored representation is always point units at reference zoom.
    pub fn from_fractional(
        page: &PageDescriptor,
        fx: f32,
        fy: f32,
        fw: f32,
        fh: f32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: AnnotationId::new(),
            page_index: page.index,
            x: fx.clamp(0.0, 1.0) * page.width_pt,
            y: fy.clamp(0.0, 1.0) * page.height_pt,
            width: fw.clamp(0.0, 1.0) * page.width_pt,
            height: fh.clamp(0.0, 1.0) * page.height_pt,
            data,
        }
    }
}

/// Every pending-edit kind the store can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Annotation {
    Text(TextAnnotation),
    Draw(DrawAnnotation),
    Image(ImageAnnotation),
    Signature(SignaturePlacement),
}

impl Annotation {
    pub fn id(&self) -> AnnotationId {
        match self {
            Self::Text(a) => a.id,
            Self::Draw(a) => a.id,
            Self::Image(a) => a.id,
            Self::Signature(a) => a.id,
        }
    }

    pub fn page_index(&self) -> usize {
        match self {
            Self::Text(a) => a.page_index,
            Self::Draw(a) => a.page_index,
            Self::Image(a) => a.page_index,
            Self::Signature(a) => a.page_index,
        }
    }
}

/// The active editing tool. One handler per variant, matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    Select,
    Text,
    Draw,
    Highlight,
    Image,
    Erase,
}

/// Encoded-image container formats the export engine can embed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    /// Sniff the container format from leading magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

/// How aggressively `compress` downsamples and re-encodes embedded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionLevel {
    Low,
    Medium,
    High,
}

impl CompressionLevel {
    /// Longest allowed edge, in pixels, for a re-encoded image.
    pub fn max_dimension(&self) -> u32 {
        match self {
            Self::Low => 2048,
            Self::Medium => 1440,
            Self::High => 960,
        }
    }

    /// JPEG re-encode quality (1-100).
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            Self::Low => 85,
            Self::Medium => 70,
            Self::High => 50,
        }
    }
}

/// Placement of a text watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatermarkPosition {
    Center,
    Diagonal,
    Tiled,
}

/// Placement of "n / total" page-number labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageNumberPosition {
    BottomCenter,
    BottomLeft,
    BottomRight,
    TopCenter,
}

/// A page rotation delta in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationDelta {
    R0,
    R90,
    R180,
    R270,
}

impl RotationDelta {
    pub fn degrees(&self) -> i64 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }
}

/// Per-source-page record for the organize operation. Rotation is a per-page
/// property from the start; it is never collapsed to a single document-wide
/// angle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageOperationState {
    /// Index of the page in the source document (0-based).
    pub original_index: usize,
    pub rotation_delta: RotationDelta,
    pub deleted: bool,
    /// Target position among the surviving pages.
    pub new_order: usize,
}

impl PageOperationState {
    /// An identity record: keep the page where it is, unrotated.
    pub fn keep(index: usize) -> Self {
        Self {
            original_index: index,
            rotation_delta: RotationDelta::R0,
            deleted: false,
            new_order: index,
        }
    }
}
