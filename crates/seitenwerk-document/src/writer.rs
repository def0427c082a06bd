// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembly — build new PDF documents from raster images using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, info, instrument};

/// A4 in millimetres.
const PAGE_W_MM: f32 = 210.0;
const PAGE_H_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;

/// Build a PDF with one A4 page per input image.
///
/// Each image is scaled to fit within the page margins while preserving its
/// aspect ratio, centred, and never upscaled. Input order is page order.
#[instrument(skip_all, fields(images = images.len()))]
pub fn images_to_pdf(images: &[&[u8]]) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(SeitenwerkError::Document(
            "no images supplied for PDF assembly".into(),
        ));
    }

    let mut doc = PdfDocument::new("Seitenwerk Document");
    let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

    for (index, image_bytes) in images.iter().enumerate() {
        let dynamic = ::image::load_from_memory(image_bytes).map_err(|err| {
            SeitenwerkError::Image(format!("failed to decode image #{}: {err}", index + 1))
        })?;

        let img_width = dynamic.width() as usize;
        let img_height = dynamic.height() as usize;

        let rgb = dynamic.to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: img_width,
            height: img_height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let usable_w_pt = Mm(PAGE_W_MM - 2.0 * MARGIN_MM).into_pt().0;
        let usable_h_pt = Mm(PAGE_H_MM - 2.0 * MARGIN_MM).into_pt().0;

        // Image native size at a default DPI of 150.
        let dpi: f32 = 150.0;
        let img_w_pt = img_width as f32 / dpi * 72.0;
        let img_h_pt = img_height as f32 / dpi * 72.0;

        // Scale to fit while preserving aspect ratio; do not upscale.
        let scale = (usable_w_pt / img_w_pt)
            .min(usable_h_pt / img_h_pt)
            .min(1.0);

        let rendered_w_pt = img_w_pt * scale;
        let rendered_h_pt = img_h_pt * scale;

        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
        let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(dpi),
                rotate: None,
            },
        }];

        debug!(index, rendered_w_pt, rendered_h_pt, scale, "Image placed");
        pages.push(PdfPage::new(Mm(PAGE_W_MM), Mm(PAGE_H_MM), ops));
    }

    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

    info!(
        pages = images.len(),
        output_bytes = output.len(),
        "Image PDF assembled"
    );
    Ok(output)
}
