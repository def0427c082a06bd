// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Commit engine.
//
// Re-parses the session's original bytes and stamps every pending annotation
// into real page content: text as Tj runs with a base-14 font, strokes as
// stroked paths (highlights behind an ExtGState alpha), images and signatures
// as XObjects (JPEG passes through as DCTDecode, PNG is decoded to raw RGB
// with an SMask carrying its alpha). The y flip out of the stored top-left
// convention into PDF user space happens here and nowhere else.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use seitenwerk_core::{
    Annotation, DrawAnnotation, DrawKind, ImageEncoding, Result, SeitenwerkError, TextAnnotation,
};
use seitenwerk_document::structure;
use tracing::{info, instrument};

use crate::session::EditorSession;
use crate::transform::to_pdf_user_space;

fn real(value: f32) -> Object {
    Object::Real(value)
}

/// Bake every pending annotation into the document and return the new bytes.
/// The session's own state is untouched; a commit with an empty store returns
/// the original bytes as-is.
#[instrument(skip(session), fields(annotations = session.store().len()))]
pub fn commit(session: &EditorSession) -> Result<Vec<u8>> {
    session.validate_for_commit()?;
    commit_snapshot(
        session.source(),
        session.store(),
        session.config().highlight_opacity,
    )
}

/// Commit over an owned snapshot of the session's pieces. Background export
/// jobs clone these and run here off the session's thread.
pub(crate) fn commit_snapshot(
    source: &[u8],
    store: &crate::store::AnnotationStore,
    highlight_opacity: f32,
) -> Result<Vec<u8>> {
    if store.is_empty() {
        return Ok(source.to_vec());
    }

    let mut doc = Document::load_mem(source)
        .map_err(|err| SeitenwerkError::Parse(format!("failed to load PDF: {err}")))?;
    let page_ids = structure::ordered_page_ids(&doc);

    for annotation in store.iter() {
        let page = annotation.page_index();
        if page >= page_ids.len() {
            return Err(SeitenwerkError::PageOutOfRange {
                page,
                page_count: page_ids.len(),
            });
        }
    }

    // One font object per (page, base font), shared across that page's text.
    let mut fonts: HashMap<(usize, &'static str), String> = HashMap::new();

    for page_index in 0..page_ids.len() {
        let annotations: Vec<Annotation> = store
            .list_for_page(page_index)
            .into_iter()
            .cloned()
            .collect();
        if annotations.is_empty() {
            continue;
        }

        let page_id = page_ids[page_index];
        let (_, page_height) = structure::page_size(&doc, page_id);
        let mut operations: Vec<Operation> = Vec::new();

        for annotation in &annotations {
            match annotation {
                Annotation::Text(text) => {
                    let base_font = text.family.base_font(text.weight);
                    let font_name = match fonts.get(&(page_index, base_font)) {
                        Some(name) => name.clone(),
                        None => {
                            let name = structure::ensure_builtin_font(&mut doc, page_id, base_font)?;
                            fonts.insert((page_index, base_font), name.clone());
                            name
                        }
                    };
                    operations.extend(text_operations(text, &font_name, page_height));
                }
                Annotation::Draw(stroke) => {
                    let gs_name = match stroke.kind {
                        DrawKind::Highlight => {
                            Some(ensure_alpha_state(&mut doc, page_id, highlight_opacity)?)
                        }
                        DrawKind::Pen => None,
                    };
                    operations.extend(stroke_operations(stroke, gs_name.as_deref(), page_height));
                }
                Annotation::Image(image) => {
                    let name = embed_image(&mut doc, page_id, image.id.to_string(), &image.data)?;
                    operations.extend(image_operations(
                        &name,
                        image.x,
                        image.y,
                        image.width,
                        image.height,
                        page_height,
                    ));
                }
                Annotation::Signature(sig) => {
                    let name = embed_image(&mut doc, page_id, sig.id.to_string(), &sig.data)?;
                    operations.extend(image_operations(
                        &name, sig.x, sig.y, sig.width, sig.height, page_height,
                    ));
                }
            }
        }

        structure::append_content(&mut doc, page_id, Content { operations })?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| SeitenwerkError::Document(format!("failed to serialise PDF: {err}")))?;
    info!(bytes = output.len(), "Committed session to PDF");
    Ok(output)
}

// -- Text ---------------------------------------------------------------------

/// Stamp a text annotation. The stored y is the box's top edge; the first
/// baseline sits one font-size below it. Multi-line text advances by a 1.2em
/// leading.
fn text_operations(text: &TextAnnotation, font_name: &str, page_height: f32) -> Vec<Operation> {
    let (r, g, b) = text.color.unit();
    let leading = text.font_size * 1.2;
    let baseline_y = to_pdf_user_space(page_height, text.y, text.font_size);

    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font_name.into(), real(text.font_size)]),
        Operation::new("rg", vec![real(r), real(g), real(b)]),
        Operation::new("TL", vec![real(leading)]),
        Operation::new("Td", vec![real(text.x), real(baseline_y)]),
    ];
    for (i, line) in text.text.lines().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("Tj", vec![Object::string_literal(line)]));
    }
    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

// -- Strokes ------------------------------------------------------------------

fn stroke_operations(
    stroke: &DrawAnnotation,
    gs_name: Option<&str>,
    page_height: f32,
) -> Vec<Operation> {
    let (r, g, b) = stroke.color.unit();
    let mut ops = vec![Operation::new("q", vec![])];
    if let Some(name) = gs_name {
        ops.push(Operation::new("gs", vec![name.into()]));
    }
    ops.push(Operation::new("w", vec![real(stroke.stroke_width)]));
    ops.push(Operation::new("RG", vec![real(r), real(g), real(b)]));
    // Round caps and joins so freehand strokes don't render with miter spikes.
    ops.push(Operation::new("J", vec![1.into()]));
    ops.push(Operation::new("j", vec![1.into()]));

    let mut points = stroke.points.iter();
    if let Some((x, y)) = points.next() {
        let flipped = to_pdf_user_space(page_height, *y, 0.0);
        ops.push(Operation::new("m", vec![real(*x), real(flipped)]));
    }
    for (x, y) in points {
        let flipped = to_pdf_user_space(page_height, *y, 0.0);
        ops.push(Operation::new("l", vec![real(*x), real(flipped)]));
    }
    ops.push(Operation::new("S", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Register an ExtGState with the given stroke/fill alpha on a page, returning
/// its resource name.
fn ensure_alpha_state(doc: &mut Document, page_id: ObjectId, alpha: f32) -> Result<String> {
    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "CA" => real(alpha),
        "ca" => real(alpha),
    });
    let name = format!("SwGs{}", gs_id.0);

    structure::with_page_resources(doc, page_id, |resources| {
        let states = match resources.get_mut(b"ExtGState") {
            Ok(Object::Dictionary(states)) => states,
            _ => {
                resources.set("ExtGState", Object::Dictionary(Dictionary::new()));
                match resources.get_mut(b"ExtGState") {
                    Ok(Object::Dictionary(states)) => states,
                    _ => unreachable!("ExtGState entry was just set"),
                }
            }
        };
        states.set(name.as_bytes(), Object::Reference(gs_id));
    })?;

    Ok(name)
}

// -- Images -------------------------------------------------------------------

fn image_operations(
    name: &str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    page_height: f32,
) -> Vec<Operation> {
    // The image XObject's unit square maps onto the placement box; the stored
    // top edge becomes a bottom edge in user space.
    let bottom = to_pdf_user_space(page_height, y, height);
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(width),
                real(0.0),
                real(0.0),
                real(height),
                real(x),
                real(bottom),
            ],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}

/// Embed encoded image bytes as an image XObject on a page, returning the
/// resource name. JPEG data passes through untouched under DCTDecode; PNG is
/// decoded to raw RGB with the alpha channel split into an SMask.
fn embed_image(
    doc: &mut Document,
    page_id: ObjectId,
    annotation: String,
    data: &[u8],
) -> Result<String> {
    let stream = match ImageEncoding::detect(data) {
        Some(ImageEncoding::Jpeg) => jpeg_xobject(data).map_err(|detail| {
            SeitenwerkError::Export {
                annotation: annotation.clone(),
                detail,
            }
        })?,
        Some(ImageEncoding::Png) => png_xobject(data).map_err(|detail| {
            SeitenwerkError::Export {
                annotation: annotation.clone(),
                detail,
            }
        })?,
        None => {
            return Err(SeitenwerkError::Export {
                annotation,
                detail: "unsupported image format (PNG or JPEG required)".into(),
            });
        }
    };

    let image_id = match stream {
        EmbeddedImage::Direct(stream) => doc.add_object(stream),
        EmbeddedImage::WithMask { mut color, mask } => {
            let mask_id = doc.add_object(mask);
            color.dict.set("SMask", Object::Reference(mask_id));
            doc.add_object(color)
        }
    };
    let name = format!("SwIm{}", image_id.0);

    structure::with_page_resources(doc, page_id, |resources| {
        let xobjects = match resources.get_mut(b"XObject") {
            Ok(Object::Dictionary(xobjects)) => xobjects,
            _ => {
                resources.set("XObject", Object::Dictionary(Dictionary::new()));
                match resources.get_mut(b"XObject") {
                    Ok(Object::Dictionary(xobjects)) => xobjects,
                    _ => unreachable!("XObject entry was just set"),
                }
            }
        };
        xobjects.set(name.as_bytes(), Object::Reference(image_id));
    })?;

    Ok(name)
}

enum EmbeddedImage {
    Direct(Stream),
    WithMask { color: Stream, mask: Stream },
}

fn jpeg_xobject(data: &[u8]) -> std::result::Result<EmbeddedImage, String> {
    let decoded =
        image::load_from_memory(data).map_err(|err| format!("cannot decode JPEG: {err}"))?;
    let color_space = match decoded.color() {
        image::ColorType::L8 | image::ColorType::L16 => "DeviceGray",
        _ => "DeviceRGB",
    };
    Ok(EmbeddedImage::Direct(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => decoded.width() as i64,
            "Height" => decoded.height() as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        data.to_vec(),
    )))
}

fn png_xobject(data: &[u8]) -> std::result::Result<EmbeddedImage, String> {
    let decoded =
        image::load_from_memory(data).map_err(|err| format!("cannot decode PNG: {err}"))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[0..3]);
        alpha.push(pixel.0[3]);
    }

    let color = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb,
    );
    let mask = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        alpha,
    );
    Ok(EmbeddedImage::WithMask { color, mask })
}
