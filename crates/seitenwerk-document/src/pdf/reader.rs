// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document model — a read-only parsed view of a loaded PDF used for
// navigation, coordinate transforms, and preview rendering. Never mutates
// the source bytes; structural edits go through `pdf::structure` and the
// export engine, both of which re-parse fresh.

use image::{ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::PageDescriptor;
use tracing::{debug, info, instrument};

/// Preview raster pixel buffer.
pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// US Letter fallback when a page carries no resolvable MediaBox.
const DEFAULT_PAGE: (f32, f32) = (612.0, 792.0);

/// Read-oriented view of a single loaded document.
pub struct DocumentModel {
    document: Document,
    /// Page descriptors in page order, cached at load.
    pages: Vec<PageDescriptor>,
}

impl std::fmt::Debug for DocumentModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentModel")
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

impl DocumentModel {
    // -- Construction ---------------------------------------------------------

    /// Parse a PDF from raw bytes.
    ///
    /// Fails with `EncryptedDocument` when the file carries an /Encrypt
    /// dictionary (passwords are handled by the remote unlock service, not
    /// here) and with `Parse` on anything lopdf cannot read.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes
            .windows(b"/Encrypt".len())
            .any(|window| window == b"/Encrypt")
        {
            return Err(SeitenwerkError::EncryptedDocument);
        }

        let document = Document::load_mem(bytes)
            .map_err(|err| SeitenwerkError::Parse(format!("failed to load PDF: {err}")))?;

        let pages = page_descriptors(&document)?;
        if pages.is_empty() {
            return Err(SeitenwerkError::Parse("document has no pages".into()));
        }

        info!(pages = pages.len(), "Document loaded");
        Ok(Self { document, pages })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Descriptor for a single page (0-based).
    pub fn page(&self, index: usize) -> Result<PageDescriptor> {
        self.pages
            .get(index)
            .copied()
            .ok_or(SeitenwerkError::PageOutOfRange {
                page: index,
                page_count: self.pages.len(),
            })
    }

    /// All page descriptors, in page order.
    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    /// Borrow the underlying parsed document (read-only).
    pub fn document(&self) -> &Document {
        &self.document
    }

    // -- Preview rendering ----------------------------------------------------

    /// Render a preview canvas for a page at the given scale (zoom x render
    /// scale factor).
    ///
    /// Produces a dimensionally exact white page with a light border; the
    /// compositor layers live annotations on top. Glyph-accurate content
    /// rendering is an external-backend seam behind this one method.
    #[instrument(skip(self), fields(index, scale))]
    pub fn render_preview(&self, index: usize, scale: f32) -> Result<RgbaImage> {
        let page = self.page(index)?;
        let scale = if scale <= 0.0 { 1.0 } else { scale };

        let width = (page.width_pt * scale).round().max(1.0) as u32;
        let height = (page.height_pt * scale).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        debug!(width, height, "Preview rendered");
        Ok(image)
    }
}

/// Build descriptors for all pages, resolving MediaBox inheritance.
fn page_descriptors(document: &Document) -> Result<Vec<PageDescriptor>> {
    let page_map = document.get_pages();
    let mut page_ids: Vec<(u32, ObjectId)> = page_map.into_iter().collect();
    page_ids.sort_by_key(|(number, _)| *number);

    let mut pages = Vec::with_capacity(page_ids.len());
    for (position, (_, page_id)) in page_ids.iter().enumerate() {
        let (width_pt, height_pt) = media_box(document, *page_id).unwrap_or(DEFAULT_PAGE);
        pages.push(PageDescriptor {
            index: position,
            width_pt,
            height_pt,
        });
    }
    Ok(pages)
}

/// Resolve a page's MediaBox, walking /Parent links for inherited values.
fn media_box(document: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let mut current = page_id;
    // Bounded walk; real page trees are shallow.
    for _ in 0..32 {
        let dict = document.get_dictionary(current).ok()?;
        if let Ok(obj) = dict.get(b"MediaBox") {
            let resolved = match obj {
                Object::Reference(id) => document.get_object(*id).ok()?,
                other => other,
            };
            if let Ok(array) = resolved.as_array() {
                if array.len() == 4 {
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    return Some(((x1 - x0).abs(), (y1 - y0).abs()));
                }
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_pdf;

    #[test]
    fn loads_and_counts_pages() {
        let bytes = sample_pdf(&["one", "two", "three"]);
        let model = DocumentModel::from_bytes(&bytes).expect("load");
        assert_eq!(model.page_count(), 3);
    }

    #[test]
    fn page_descriptor_carries_letter_dimensions() {
        let bytes = sample_pdf(&["only"]);
        let model = DocumentModel::from_bytes(&bytes).expect("load");
        let page = model.page(0).expect("page 0");
        assert!((page.width_pt - 612.0).abs() < 0.01);
        assert!((page.height_pt - 792.0).abs() < 0.01);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let bytes = sample_pdf(&["only"]);
        let model = DocumentModel::from_bytes(&bytes).expect("load");
        assert!(matches!(
            model.page(1),
            Err(SeitenwerkError::PageOutOfRange { page: 1, page_count: 1 })
        ));
    }

    #[test]
    fn garbage_bytes_fail_with_parse_error() {
        let err = DocumentModel::from_bytes(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, SeitenwerkError::Parse(_)));
    }

    #[test]
    fn encrypt_marker_is_rejected_before_parse() {
        let mut bytes = sample_pdf(&["x"]);
        bytes.extend_from_slice(b"/Encrypt");
        let err = DocumentModel::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, SeitenwerkError::EncryptedDocument));
    }

    #[test]
    fn merged_output_survives_a_disk_round_trip() {
        let doc_a = sample_pdf(&["one"]);
        let doc_b = sample_pdf(&["two"]);
        let merged = crate::structure::merge(&[&doc_a, &doc_b]).expect("merge");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("merged.pdf");
        std::fs::write(&path, &merged).expect("write");
        let reread = std::fs::read(&path).expect("read back");

        let model = DocumentModel::from_bytes(&reread).expect("load from disk");
        assert_eq!(model.page_count(), 2);
    }

    #[test]
    fn preview_matches_scaled_page_dimensions() {
        let bytes = sample_pdf(&["x"]);
        let model = DocumentModel::from_bytes(&bytes).expect("load");
        let img = model.render_preview(0, 1.5).expect("preview");
        assert_eq!(img.width(), (612.0f32 * 1.5).round() as u32);
        assert_eq!(img.height(), (792.0f32 * 1.5).round() as u32);
    }
}
