// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page text extraction — walks content streams tracking the text cursor
// and groups shown strings into lines by vertical position.
//
// Handles simple-encoding text (the base-14 fonts this toolkit writes and
// the common case for machine-generated documents). CID/composite font
// decoding is out of scope.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use seitenwerk_core::error::{Result, SeitenwerkError};

use super::structure::ordered_page_ids;

/// Strings shown within this vertical distance belong to the same line.
const LINE_TOLERANCE: f32 = 5.0;

/// One extracted line of text with its vertical position (text-space units,
/// larger y = higher on the page).
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub y: f32,
    pub text: String,
}

/// Extract the text lines of one page (0-based), sorted top to bottom.
pub fn extract_lines(source: &[u8], page_index: usize) -> Result<Vec<TextLine>> {
    let doc = Document::load_mem(source)
        .map_err(|err| SeitenwerkError::Parse(format!("failed to load PDF: {err}")))?;
    let page_ids = ordered_page_ids(&doc);
    let page_id = *page_ids
        .get(page_index)
        .ok_or(SeitenwerkError::PageOutOfRange {
            page: page_index,
            page_count: page_ids.len(),
        })?;
    extract_lines_from(&doc, page_id)
}

/// Extract lines from an already-parsed document.
pub(crate) fn extract_lines_from(doc: &Document, page_id: ObjectId) -> Result<Vec<TextLine>> {
    let content_bytes = doc
        .get_page_content(page_id)
        .map_err(|err| SeitenwerkError::Parse(format!("cannot read page content: {err}")))?;
    let content = Content::decode(&content_bytes)
        .map_err(|err| SeitenwerkError::Parse(format!("cannot decode content stream: {err}")))?;

    let mut items: Vec<(f32, f32, String)> = Vec::new();
    let mut tx: f32 = 0.0;
    let mut ty: f32 = 0.0;
    let mut leading: f32 = 0.0;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                tx = 0.0;
                ty = 0.0;
                leading = 0.0;
            }
            "Tm" => {
                if op.operands.len() == 6 {
                    if let Ok(e) = op.operands[4].as_float() {
                        tx = e;
                    }
                    if let Ok(f) = op.operands[5].as_float() {
                        ty = f;
                    }
                }
            }
            "Td" => {
                if op.operands.len() == 2 {
                    if let Ok(dx) = op.operands[0].as_float() {
                        tx += dx;
                    }
                    if let Ok(dy) = op.operands[1].as_float() {
                        ty += dy;
                    }
                }
            }
            "TD" => {
                if op.operands.len() == 2 {
                    if let Ok(dx) = op.operands[0].as_float() {
                        tx += dx;
                    }
                    if let Ok(dy) = op.operands[1].as_float() {
                        leading = -dy;
                        ty += dy;
                    }
                }
            }
            "TL" => {
                if let Some(Ok(l)) = op.operands.first().map(|o| o.as_float()) {
                    leading = l;
                }
            }
            "T*" => ty -= leading,
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(decode_string) {
                    push_item(&mut items, tx, ty, text);
                }
            }
            "'" => {
                ty -= leading;
                if let Some(text) = op.operands.first().and_then(decode_string) {
                    push_item(&mut items, tx, ty, text);
                }
            }
            "\"" => {
                ty -= leading;
                if let Some(text) = op.operands.get(2).and_then(decode_string) {
                    push_item(&mut items, tx, ty, text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = op.operands.first() {
                    let mut combined = String::new();
                    for part in parts {
                        if let Some(text) = decode_string(part) {
                            combined.push_str(&text);
                        }
                    }
                    push_item(&mut items, tx, ty, combined);
                }
            }
            _ => {}
        }
    }

    Ok(group_into_lines(items))
}

fn decode_string(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

fn push_item(items: &mut Vec<(f32, f32, String)>, x: f32, y: f32, text: String) {
    if !text.trim().is_empty() {
        items.push((x, y, text));
    }
}

/// Group positioned strings into lines: items within `LINE_TOLERANCE` of a
/// line's anchor join that line, ordered left to right within it; lines come
/// out top to bottom.
fn group_into_lines(mut items: Vec<(f32, f32, String)>) -> Vec<TextLine> {
    // Stable sort keeps encounter order for same-y items.
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut group: Vec<(f32, f32, String)> = Vec::new();
    for item in items {
        let joins_line = group
            .first()
            .is_some_and(|anchor| (anchor.1 - item.1).abs() <= LINE_TOLERANCE);
        if !joins_line {
            flush_line(&mut lines, std::mem::take(&mut group));
        }
        group.push(item);
    }
    flush_line(&mut lines, group);
    lines
}

/// Join one grouped line in reading order. Stable sort falls back to
/// encounter order for items at the same x.
fn flush_line(lines: &mut Vec<TextLine>, mut group: Vec<(f32, f32, String)>) {
    let Some(&(_, y, _)) = group.first() else {
        return;
    };
    group.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let text = group
        .iter()
        .map(|(_, _, text)| text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(TextLine { y, text });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_pdf;
    use lopdf::content::Operation;
    use lopdf::{Stream, dictionary};

    /// Build a one-page PDF with text shown at explicit (x, y) positions.
    fn positioned_pdf(texts: &[(&str, f32, f32)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut operations = Vec::new();
        for (text, x, y) in texts {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new(
                "Td",
                vec![Object::Real(*x), Object::Real(*y)],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
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

    #[test]
    fn extracts_single_line() {
        let bytes = sample_pdf(&["hello world"]);
        let lines = extract_lines(&bytes, 0).expect("extract");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "hello world");
    }

    #[test]
    fn items_within_tolerance_share_a_line() {
        let bytes = positioned_pdf(&[("left", 72.0, 700.0), ("right", 300.0, 702.0)]);
        let lines = extract_lines(&bytes, 0).expect("extract");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "left right");
    }

    #[test]
    fn same_line_items_read_left_to_right_regardless_of_draw_order() {
        let bytes = positioned_pdf(&[("right", 300.0, 702.0), ("left", 72.0, 700.0)]);
        let lines = extract_lines(&bytes, 0).expect("extract");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "left right");
    }

    #[test]
    fn lines_come_out_top_to_bottom() {
        let bytes = positioned_pdf(&[
            ("bottom", 72.0, 100.0),
            ("top", 72.0, 700.0),
            ("middle", 72.0, 400.0),
        ]);
        let lines = extract_lines(&bytes, 0).expect("extract");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["top", "middle", "bottom"]);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let bytes = sample_pdf(&["only"]);
        assert!(matches!(
            extract_lines(&bytes, 5),
            Err(SeitenwerkError::PageOutOfRange { .. })
        ));
    }
}
