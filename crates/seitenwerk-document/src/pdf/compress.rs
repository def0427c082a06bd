// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document compression — re-encodes embedded JPEG image XObjects at a
// quality and resolution chosen by the compression level, then applies
// stream-level flate compression to the whole document.
//
// Only DCT-encoded images without a soft mask are touched; a replacement is
// kept only when it is actually smaller. Everything else in the document is
// preserved as-is.

use image::imageops::FilterType;
use lopdf::{Document, Object, ObjectId, Stream};
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::CompressionLevel;
use tracing::{debug, info, instrument};

/// Re-encode embedded images and recompress streams.
#[instrument(skip(source), fields(bytes_len = source.len(), ?level))]
pub fn compress(source: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(source)
        .map_err(|err| SeitenwerkError::Parse(format!("failed to load PDF: {err}")))?;

    let object_ids: Vec<ObjectId> = doc.objects.keys().copied().collect();
    let mut recoded = 0usize;

    for id in object_ids {
        let Some(replacement) = plan_replacement(&doc, id, level) else {
            continue;
        };
        doc.objects.insert(id, Object::Stream(replacement));
        recoded += 1;
    }

    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| SeitenwerkError::Document(format!("failed to serialise PDF: {err}")))?;

    info!(
        recoded,
        input_bytes = source.len(),
        output_bytes = output.len(),
        "Compression complete"
    );
    Ok(output)
}

/// Decide whether object `id` is a recodable image and build its replacement
/// stream. Returns None when the object should be left alone.
fn plan_replacement(doc: &Document, id: ObjectId, level: CompressionLevel) -> Option<Stream> {
    let Ok(Object::Stream(stream)) = doc.get_object(id) else {
        return None;
    };

    let subtype = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|s| s.as_name().ok())?;
    if subtype != b"Image" {
        return None;
    }
    if !has_dct_filter(stream) {
        return None;
    }
    // A downsampled image under an unchanged soft mask would misalign.
    if stream.dict.get(b"SMask").is_ok() {
        return None;
    }

    let decoded = image::load_from_memory(&stream.content).ok()?;
    let (width, height) = (decoded.width(), decoded.height());

    let max_dim = level.max_dimension();
    let resized = if width.max(height) > max_dim {
        decoded.resize(max_dim, max_dim, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = image::DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut encoded = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut encoded, level.jpeg_quality());
    encoder.encode_image(&rgb).ok()?;

    if encoded.len() >= stream.content.len() {
        debug!(?id, "Re-encode did not shrink image, keeping original");
        return None;
    }

    let mut dict = stream.dict.clone();
    dict.set("Width", Object::Integer(rgb.width() as i64));
    dict.set("Height", Object::Integer(rgb.height() as i64));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));

    debug!(
        ?id,
        from_bytes = stream.content.len(),
        to_bytes = encoded.len(),
        "Image re-encoded"
    );
    Some(Stream::new(dict, encoded))
}

/// Whether a stream's /Filter is (or includes) DCTDecode.
fn has_dct_filter(stream: &Stream) -> bool {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => name == b"DCTDecode",
        Ok(Object::Array(filters)) => filters
            .iter()
            .any(|f| matches!(f, Object::Name(name) if name == b"DCTDecode")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use lopdf::content::{Content, Operation};
    use lopdf::dictionary;

    /// A one-page PDF embedding a gradient JPEG of the given size.
    fn pdf_with_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
        }
        let mut jpeg = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
        encoder
            .encode_image(&image::DynamicImage::ImageRgb8(img))
            .expect("encode jpeg");

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(400.0),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(300.0),
                        Object::Real(100.0),
                        Object::Real(400.0),
                    ],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save");
        out
    }

    fn largest_image_dims(bytes: &[u8]) -> Option<(i64, i64)> {
        let doc = Document::load_mem(bytes).expect("load");
        doc.objects.values().find_map(|obj| match obj {
            Object::Stream(stream)
                if stream.dict.get(b"Subtype").ok().and_then(|s| s.as_name().ok())
                    == Some(b"Image") =>
            {
                let w = stream.dict.get(b"Width").ok()?.as_i64().ok()?;
                let h = stream.dict.get(b"Height").ok()?.as_i64().ok()?;
                Some((w, h))
            }
            _ => None,
        })
    }

    #[test]
    fn high_level_downsamples_large_images() {
        let bytes = pdf_with_jpeg(1600, 1200, 95);
        let compressed = compress(&bytes, CompressionLevel::High).expect("compress");
        let (w, h) = largest_image_dims(&compressed).expect("image survives");
        assert!(w <= 960 && h <= 960, "got {w}x{h}");
    }

    #[test]
    fn small_images_keep_their_dimensions() {
        let bytes = pdf_with_jpeg(320, 240, 95);
        let compressed = compress(&bytes, CompressionLevel::Low).expect("compress");
        let (w, h) = largest_image_dims(&compressed).expect("image survives");
        assert_eq!((w, h), (320, 240));
    }

    #[test]
    fn output_is_a_loadable_document() {
        let bytes = pdf_with_jpeg(1600, 1200, 95);
        let compressed = compress(&bytes, CompressionLevel::Medium).expect("compress");
        let model = crate::DocumentModel::from_bytes(&compressed).expect("reload");
        assert_eq!(model.page_count(), 1);
    }

    #[test]
    fn documents_without_images_pass_through() {
        let bytes = crate::testutil::sample_pdf(&["no images here"]);
        let compressed = compress(&bytes, CompressionLevel::High).expect("compress");
        let model = crate::DocumentModel::from_bytes(&compressed).expect("reload");
        assert_eq!(model.page_count(), 1);
    }

    #[test]
    fn source_bytes_are_untouched() {
        let bytes = pdf_with_jpeg(1600, 1200, 95);
        let snapshot = bytes.clone();
        let _ = compress(&bytes, CompressionLevel::High).expect("compress");
        assert_eq!(bytes, snapshot);
    }
}
